use crate::{
    auth::{
        auth::AuthUser,
        jwt::{generate_access_token, generate_refresh_token, verify_token},
        password::{generate_temp_password, hash_password, verify_password},
    },
    config::Config,
    models::{LoginReqDto, LoginUserSql, TokenType},
    perm::{resolve_role, Role},
    utils::audit::log_audit,
};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};

// auth end points

#[derive(Serialize, Deserialize)]
struct LoginResponse {
    access_token: String,
    refresh_token: String,
    /// role name for the client's session store
    role: String,
    employee_id: Option<String>,
    name: Option<String>,
    /// true forces the client into the reset-password flow
    temp_password: bool,
}

#[derive(sqlx::FromRow)]
struct RefreshTokenRow {
    id: u64,
    user_id: u64,
    revoked: bool,
}

#[instrument(
    name = "auth_login",
    skip(pool, config, user),
    fields(username = %user.username)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    // 1. Basic validation
    if user.username.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty username or password");
        return HttpResponse::BadRequest().body("Username or password required");
    }

    debug!("Fetching user from database");

    // 2. Fetch user joined with the linked employee row for the role
    let db_user = match sqlx::query_as::<_, LoginUserSql>(
        r#"
        SELECT u.id, u.username, u.password, u.employee_id, u.temp_password,
               e.role, e.name
        FROM users u
        LEFT JOIN employees e ON e.id = u.employee_id
        WHERE u.username = ?
        "#,
    )
    .bind(&user.username)
    .fetch_optional(pool.get_ref())
    .await
    {
        Ok(Some(user)) => {
            debug!(user_id = user.id, "User found");
            user
        }
        Ok(None) => {
            info!("Invalid credentials: user not found");
            return HttpResponse::Unauthorized().body("Invalid credentials");
        }
        Err(e) => {
            error!(error = %e, "Database error while fetching user");
            return HttpResponse::InternalServerError().finish();
        }
    };

    // 3. Verify password
    debug!("Verifying password");

    if let Err(e) = verify_password(&user.password, &db_user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return HttpResponse::Unauthorized().body("Invalid credentials");
    }

    debug!("Password verified");

    // Role travels by name; unknown names degrade to Employee when the
    // resolver reads them back.
    let role_name = db_user
        .role
        .clone()
        .unwrap_or_else(|| Role::Employee.to_string());

    // 4. Generate access token
    debug!("Generating access token");

    let access_token = match generate_access_token(
        db_user.id,
        db_user.username.clone(),
        role_name.clone(),
        db_user.employee_id.clone(),
        &config.jwt_secret,
        config.access_token_ttl,
    ) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "Failed to sign access token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    // 5. Generate refresh token
    debug!("Generating refresh token");

    let (refresh_token, refresh_claims) = match generate_refresh_token(
        db_user.id,
        db_user.username.clone(),
        role_name.clone(),
        db_user.employee_id.clone(),
        &config.jwt_secret,
        config.refresh_token_ttl,
    ) {
        Ok(pair) => pair,
        Err(e) => {
            error!(error = %e, "Failed to sign refresh token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    // 6. Store refresh token
    debug!(
        user_id = db_user.id,
        jti = %refresh_claims.jti,
        "Storing refresh token"
    );

    if let Err(e) = sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(db_user.id)
    .bind(&refresh_claims.jti)
    .bind(refresh_claims.exp as i64)
    .execute(pool.get_ref())
    .await
    {
        error!(error = %e, "Failed to store refresh token");
        return HttpResponse::InternalServerError().finish();
    }

    // 7. Update last_login_at (non-fatal)
    debug!("Updating last_login_at");

    if let Err(e) = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE username = ?")
        .bind(&user.username)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to update last_login_at");
        // intentionally not failing login
    }

    info!("Login successful");

    HttpResponse::Ok().json(LoginResponse {
        access_token,
        refresh_token,
        role: role_name,
        employee_id: db_user.employee_id,
        name: db_user.name,
        temp_password: db_user.temp_password,
    })
}

pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let header = match req.headers().get("Authorization") {
        Some(h) => h.to_str().unwrap_or(""),
        None => return HttpResponse::Unauthorized().body("No token"),
    };

    let token = match header.strip_prefix("Bearer ") {
        Some(t) => t,
        None => return HttpResponse::Unauthorized().body("Invalid token"),
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return HttpResponse::Unauthorized().finish(),
    };

    if claims.token_type != TokenType::Refresh {
        return HttpResponse::Unauthorized().finish();
    }

    // find refresh token in DB
    let record = match sqlx::query_as::<_, RefreshTokenRow>(
        r#"
        SELECT id, user_id, revoked
        FROM refresh_tokens
        WHERE jti = ?
        "#,
    )
    .bind(&claims.jti)
    .fetch_optional(pool.get_ref())
    .await
    {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "Failed to look up refresh token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let record = match record {
        Some(r) if !r.revoked => r,
        _ => return HttpResponse::Unauthorized().finish(),
    };

    // revoke old refresh token
    if let Err(e) = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE id = ?")
        .bind(record.id)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to revoke refresh token");
        return HttpResponse::InternalServerError().finish();
    }

    // issue new refresh token
    let (new_refresh_token, new_claims) = match generate_refresh_token(
        claims.user_id,
        claims.sub.clone(),
        claims.role.clone(),
        claims.employee_id.clone(),
        &config.jwt_secret,
        config.refresh_token_ttl,
    ) {
        Ok(pair) => pair,
        Err(e) => {
            error!(error = %e, "Failed to sign refresh token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    if let Err(e) = sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(record.user_id)
    .bind(&new_claims.jti)
    .bind(new_claims.exp as i64)
    .execute(pool.get_ref())
    .await
    {
        error!(error = %e, "Failed to store refresh token");
        return HttpResponse::InternalServerError().finish();
    }

    // new access token
    let access_token = match generate_access_token(
        claims.user_id,
        claims.sub.clone(),
        claims.role.clone(),
        claims.employee_id.clone(),
        &config.jwt_secret,
        config.access_token_ttl,
    ) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "Failed to sign access token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    HttpResponse::Ok().json(serde_json::json!({
        "access_token": access_token,
        "refresh_token": new_refresh_token
    }))
}

pub async fn logout(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    // 1. extract Authorization header
    let header = match req.headers().get("Authorization") {
        Some(h) => h.to_str().unwrap_or(""),
        None => return HttpResponse::NoContent().finish(),
    };

    let token = match header.strip_prefix("Bearer ") {
        Some(t) => t,
        None => return HttpResponse::NoContent().finish(),
    };

    // 2. verify JWT
    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return HttpResponse::NoContent().finish(),
    };

    // 3. only refresh tokens can logout
    if claims.token_type != TokenType::Refresh {
        return HttpResponse::NoContent().finish();
    }

    // 4. revoke refresh token (idempotent)
    let _ = sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET revoked = TRUE
        WHERE jti = ?
        "#,
    )
    .bind(&claims.jti)
    .execute(pool.get_ref())
    .await;

    // 5. success (even if token didn't exist)
    HttpResponse::NoContent().finish()
}

#[derive(Deserialize)]
pub struct TempPasswordReq {
    pub employee_id: String,
}

/// Issue a temporary password for a subordinate. The target's role
/// must be inside the caller's subordinate scope.
pub async fn create_temp_password(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<TempPasswordReq>,
) -> actix_web::Result<impl Responder> {
    let employee_id = payload.employee_id.trim().to_uppercase();

    if !crate::api::employee::employee_exists(&employee_id, pool.get_ref()).await {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    }

    let target_role: Option<String> =
        sqlx::query_scalar("SELECT role FROM employees WHERE id = ?")
            .bind(&employee_id)
            .fetch_optional(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, employee_id, "Failed to fetch employee role");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;

    let target_role = match target_role {
        Some(r) => resolve_role(Some(&r)),
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Employee not found"
            })))
        }
    };

    auth.require_scope_over(target_role)?;

    let temp = generate_temp_password();
    let hashed = hash_password(&temp).map_err(|e| {
        error!(error = %e, "Failed to hash temp password");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // The username IS the employee id; re-issuing overwrites any
    // previous credentials and flips the temp flag back on.
    sqlx::query(
        r#"
        INSERT INTO users (username, password, employee_id, temp_password)
        VALUES (?, ?, ?, TRUE)
        ON DUPLICATE KEY UPDATE password = VALUES(password), temp_password = TRUE
        "#,
    )
    .bind(&employee_id)
    .bind(&hashed)
    .bind(&employee_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to store temp password");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    log_audit(
        pool.get_ref(),
        "User",
        &employee_id,
        "CREATE",
        auth.employee_id.as_deref().unwrap_or(&auth.username),
        Some("Temporary password issued"),
    )
    .await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Temporary password created",
        "temp_password": temp
    })))
}

#[derive(Deserialize)]
pub struct ResetPasswordReq {
    pub username: String,
    pub old_password: String,
    pub new_password: String,
}

/// Self-service password reset, used after logging in with a
/// temporary password. Public; rate-limited alongside login.
pub async fn reset_password(
    payload: web::Json<ResetPasswordReq>,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    if payload.new_password.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "New password must not be empty"
        })));
    }

    let row: Option<(u64, String)> =
        sqlx::query_as("SELECT id, password FROM users WHERE username = ?")
            .bind(&payload.username)
            .fetch_optional(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch user for password reset");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;

    let (user_id, current_hash) = match row {
        Some(r) => r,
        None => return Ok(HttpResponse::Unauthorized().body("Invalid credentials")),
    };

    if verify_password(&payload.old_password, &current_hash).is_err() {
        return Ok(HttpResponse::Unauthorized().body("Invalid credentials"));
    }

    let hashed = hash_password(&payload.new_password).map_err(|e| {
        error!(error = %e, "Failed to hash new password");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    sqlx::query("UPDATE users SET password = ?, temp_password = FALSE WHERE id = ?")
        .bind(&hashed)
        .bind(user_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, user_id, "Failed to update password");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Password updated"
    })))
}
