use crate::{
    auth::auth::AuthUser,
    model::employee::Employee,
    perm::{manager_roles_for, resolve_role, subordinates_of, Role},
    utils::audit::log_audit,
    utils::db_utils::{build_update_sql, execute_update},
    utils::employee_id_cache,
    utils::employee_id_filter,
    utils::id_gen::{generate_unique_id, EntityKind},
};
use actix_web::{error::ErrorInternalServerError, web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::MySqlPool;
use tracing::{debug, error};
use utoipa::{IntoParams, ToSchema};

/// true => an employees row with this id exists.
/// Cuckoo filter gives the fast negative, moka cache the fast
/// positive, the database settles the rest.
pub async fn employee_exists(employee_id: &str, pool: &MySqlPool) -> bool {
    let employee_id = employee_id.trim().to_uppercase();

    // 1. Cuckoo filter — fast negative
    if !employee_id_filter::might_exist(&employee_id) {
        return false;
    }

    // 2. Moka cache — fast positive
    if employee_id_cache::is_known(&employee_id).await {
        return true;
    }

    // 3. Database fallback
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM employees WHERE id = ? LIMIT 1)",
    )
    .bind(&employee_id)
    .fetch_one(pool)
    .await
    .unwrap_or(false);

    if exists {
        employee_id_cache::mark_known(&employee_id).await;
    }

    exists
}

/// Role name of an employee, if the row exists.
pub async fn employee_role(
    employee_id: &str,
    pool: &MySqlPool,
) -> Result<Option<Role>, sqlx::Error> {
    let raw: Option<String> = sqlx::query_scalar("SELECT role FROM employees WHERE id = ?")
        .bind(employee_id)
        .fetch_optional(pool)
        .await?;

    Ok(raw.map(|r| resolve_role(Some(&r))))
}

fn looks_like_aadhaar(value: &str) -> bool {
    value.len() == 12 && value.chars().all(|c| c.is_ascii_digit())
}

fn looks_like_contact(value: &str) -> bool {
    let digits = value.strip_prefix('+').unwrap_or(value);
    (10..=13).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

#[derive(Deserialize, Serialize, ToSchema)]
pub struct OnboardEmployee {
    #[schema(example = "John Doe")]
    pub name: String,
    #[schema(example = "Employee")]
    pub role: String,
    #[schema(example = "EM-1B9E0D44A2-250101", nullable = true)]
    pub manager_id: Option<String>,
    #[schema(example = "+919812345678", nullable = true)]
    pub contact: Option<String>,
    #[schema(example = "123412341234", nullable = true)]
    pub aadhaar_number: Option<String>,
    #[schema(example = 50000.0, nullable = true)]
    pub salary_per_month: Option<f64>,
    #[schema(example = 200.0, nullable = true)]
    pub overtime_charge_per_hour: Option<f64>,
    #[schema(example = 150.0, nullable = true)]
    pub deduct_per_hour: Option<f64>,
    #[schema(example = 1200.0, nullable = true)]
    pub deduct_per_day: Option<f64>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct EmployeeQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Exact employee id
    pub id: Option<String>,
    /// Substring match on the name
    pub name: Option<String>,
    /// Role filter; must lie inside the caller's subordinate scope
    pub role: Option<String>,
    pub manager_id: Option<String>,
    pub contact: Option<String>,
    pub aadhaar_number: Option<String>,
    pub is_active: Option<bool>,
}

// Helper enum for typed SQLx binding
enum FilterValue {
    Str(String),
    Bool(bool),
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// Onboard Employee
#[utoipa::path(
    post,
    path = "/api/v1/employee",
    request_body = OnboardEmployee,
    responses(
        (status = 200, description = "Employee onboarded", body = Object, example = json!({
            "message": "Employee onboarded",
            "id": "EM-7F3A8C21C9-251006"
        })),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Target role outside your scope"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Employee"
)]
pub async fn onboard_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<OnboardEmployee>,
) -> actix_web::Result<impl Responder> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Name must not be empty"
        })));
    }

    // Only roles the table recognizes can be onboarded.
    let target_role: Role = match payload.role.parse() {
        Ok(r) => r,
        Err(_) => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": format!("Unknown role '{}'", payload.role)
            })));
        }
    };

    auth.require_scope_over(target_role)?;

    if let Some(aadhaar) = payload.aadhaar_number.as_deref() {
        if !looks_like_aadhaar(aadhaar) {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "Aadhaar number must be 12 digits"
            })));
        }
    }

    if let Some(contact) = payload.contact.as_deref() {
        if !looks_like_contact(contact) {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "Contact number is not valid"
            })));
        }
    }

    // Everyone but MD reports to somebody, and only to the roles the
    // manager table allows for the new hire's tier.
    let allowed_manager_roles = manager_roles_for(target_role);
    match payload.manager_id.as_deref() {
        None if !allowed_manager_roles.is_empty() => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "manager_id is required for this role"
            })));
        }
        Some(manager_id) => {
            let manager_role = employee_role(manager_id, pool.get_ref())
                .await
                .map_err(|e| {
                    error!(error = %e, manager_id, "Failed to fetch manager");
                    ErrorInternalServerError("Internal Server Error")
                })?;

            match manager_role {
                None => {
                    return Ok(HttpResponse::BadRequest().json(json!({
                        "message": "Manager not found"
                    })));
                }
                Some(role) if !allowed_manager_roles.contains(&role) => {
                    return Ok(HttpResponse::BadRequest().json(json!({
                        "message": format!("A {} cannot report to a {}", target_role, role)
                    })));
                }
                Some(_) => {}
            }
        }
        None => {}
    }

    let employee_id = generate_unique_id(EntityKind::Employee);

    sqlx::query(
        r#"
        INSERT INTO employees
        (id, name, role, manager_id, contact, aadhaar_number, is_active,
         salary_per_month, overtime_charge_per_hour, deduct_per_hour, deduct_per_day)
        VALUES (?, ?, ?, ?, ?, ?, TRUE, ?, ?, ?, ?)
        "#,
    )
    .bind(&employee_id)
    .bind(name)
    .bind(target_role.to_string())
    .bind(&payload.manager_id)
    .bind(&payload.contact)
    .bind(&payload.aadhaar_number)
    .bind(payload.salary_per_month)
    .bind(payload.overtime_charge_per_hour)
    .bind(payload.deduct_per_hour)
    .bind(payload.deduct_per_day)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to onboard employee");
        ErrorInternalServerError("Internal Server Error")
    })?;

    // keep the fast-path lookups in step with the new row
    employee_id_filter::insert(&employee_id);
    employee_id_cache::mark_known(&employee_id).await;

    log_audit(
        pool.get_ref(),
        "Employee",
        &employee_id,
        "CREATE",
        auth.employee_id.as_deref().unwrap_or(&auth.username),
        Some(&format!("Onboarded {} as {}", name, target_role)),
    )
    .await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee onboarded",
        "id": employee_id
    })))
}

/// Search employees inside the caller's subordinate scope
#[utoipa::path(
    get,
    path = "/api/v1/employee",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Requested role outside your scope")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Employee"
)]
pub async fn search_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> actix_web::Result<impl Responder> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // ---------- role scope ----------
    let scope = subordinates_of(auth.role);

    let scoped_roles: Vec<String> = match query.role.as_deref() {
        Some(raw) => {
            let requested = resolve_role(Some(raw));
            if !scope.contains(&requested) {
                return Err(actix_web::error::ErrorForbidden(
                    "Requested role outside your scope",
                ));
            }
            vec![requested.to_string()]
        }
        None => scope.iter().map(|r| r.to_string()).collect(),
    };

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let mut bindings: Vec<FilterValue> = Vec::new();

    let role_placeholders = vec!["?"; scoped_roles.len()].join(", ");
    conditions.push(format!("role IN ({})", role_placeholders));
    for role in scoped_roles {
        bindings.push(FilterValue::Str(role));
    }

    if let Some(id) = &query.id {
        conditions.push("id = ?".to_string());
        bindings.push(FilterValue::Str(id.trim().to_uppercase()));
    }

    if let Some(name) = &query.name {
        conditions.push("name LIKE ?".to_string());
        bindings.push(FilterValue::Str(format!("%{}%", name)));
    }

    if let Some(manager_id) = &query.manager_id {
        conditions.push("manager_id = ?".to_string());
        bindings.push(FilterValue::Str(manager_id.trim().to_uppercase()));
    }

    if let Some(contact) = &query.contact {
        conditions.push("contact = ?".to_string());
        bindings.push(FilterValue::Str(contact.clone()));
    }

    if let Some(aadhaar) = &query.aadhaar_number {
        conditions.push("aadhaar_number = ?".to_string());
        bindings.push(FilterValue::Str(aadhaar.clone()));
    }

    if let Some(is_active) = query.is_active {
        conditions.push("is_active = ?".to_string());
        bindings.push(FilterValue::Bool(is_active));
    }

    let where_clause = format!("WHERE {}", conditions.join(" AND "));

    // ---------- total count ----------
    let count_sql = format!("SELECT COUNT(*) FROM employees {}", where_clause);
    debug!(sql = %count_sql, "Counting employees");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = match b {
            FilterValue::Str(v) => count_query.bind(v),
            FilterValue::Bool(v) => count_query.bind(*v),
        };
    }

    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %count_sql, "Failed to count employees");
        ErrorInternalServerError("Database error")
    })?;

    // ---------- data query ----------
    let data_sql = format!(
        "SELECT * FROM employees {} ORDER BY serial_no DESC LIMIT ? OFFSET ?",
        where_clause
    );
    debug!(sql = %data_sql, page, per_page, offset, "Fetching employees");

    let mut data_query = sqlx::query_as::<_, Employee>(&data_sql);
    for b in &bindings {
        data_query = match b {
            FilterValue::Str(v) => data_query.bind(v),
            FilterValue::Bool(v) => data_query.bind(*v),
        };
    }
    data_query = data_query.bind(per_page as i64).bind(offset as i64);

    let employees = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %data_sql, "Failed to fetch employees");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data: employees,
        page,
        per_page,
        total,
    }))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/v1/employee/{employee_id}",
    params(
        ("employee_id" = String, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Employee outside your scope"),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Employee"
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner().trim().to_uppercase();

    let employee = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ?")
        .bind(&employee_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Failed to fetch employee");
            ErrorInternalServerError("Internal Server Error")
        })?;

    let employee = match employee {
        Some(e) => e,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Employee not found"
            })));
        }
    };

    // own record is always visible; anyone else must be in scope
    let is_self = auth.employee_id.as_deref() == Some(employee.id.as_str());
    if !is_self {
        auth.require_scope_over(resolve_role(Some(&employee.role)))?;
    }

    Ok(HttpResponse::Ok().json(employee))
}

/// Update Employee (MD/PD only)
#[utoipa::path(
    put,
    path = "/api/v1/employee/{employee_id}",
    params(
        ("employee_id" = String, Path, description = "Employee ID")
    ),
    request_body = Object,
    responses(
        (status = 200, description = "Employee updated successfully"),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Employee"
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_employee_data_role()?;

    let employee_id = path.into_inner().trim().to_uppercase();

    if let Some(obj) = body.as_object() {
        if obj.contains_key("id") || obj.contains_key("serial_no") {
            return Ok(HttpResponse::BadRequest().body("Employee id cannot be changed"));
        }
    }

    let update = build_update_sql("employees", &body, "id", &employee_id)?;

    let affected = execute_update(pool.get_ref(), update)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().body("Employee not found"));
    }

    log_audit(
        pool.get_ref(),
        "Employee",
        &employee_id,
        "UPDATE",
        auth.employee_id.as_deref().unwrap_or(&auth.username),
        None,
    )
    .await;

    Ok(HttpResponse::Ok().body("Employee updated successfully"))
}

/// Delete Employee (MD/PD only)
#[utoipa::path(
    delete,
    path = "/api/v1/employee/{employee_id}",
    params(
        ("employee_id" = String, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "Successfully deleted"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        })),
        (status = 500, description = "Internal server error", body = Object)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Employee"
)]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    auth.require_employee_data_role()?;

    let employee_id = path.into_inner().trim().to_uppercase();

    let result = sqlx::query("DELETE FROM employees WHERE id = ?")
        .bind(&employee_id)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(res) => {
            if res.rows_affected() == 0 {
                return Ok(HttpResponse::NotFound().json(json!({
                    "message": "Employee not found"
                })));
            }

            employee_id_filter::remove(&employee_id);

            log_audit(
                pool.get_ref(),
                "Employee",
                &employee_id,
                "DELETE",
                auth.employee_id.as_deref().unwrap_or(&auth.username),
                None,
            )
            .await;

            Ok(HttpResponse::Ok().json(json!({
                "message": "Successfully deleted"
            })))
        }

        Err(e) => {
            error!(error = %e, employee_id, "Failed to delete employee");

            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aadhaar_is_twelve_digits() {
        assert!(looks_like_aadhaar("123412341234"));
        assert!(!looks_like_aadhaar("12341234123"));
        assert!(!looks_like_aadhaar("12341234123a"));
    }

    #[test]
    fn contact_accepts_plus_prefix() {
        assert!(looks_like_contact("+919812345678"));
        assert!(looks_like_contact("9812345678"));
        assert!(!looks_like_contact("12345"));
        assert!(!looks_like_contact("98123-45678"));
    }
}
