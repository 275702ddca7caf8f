use actix_web::{error::ErrorInternalServerError, web, HttpResponse, Responder};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::model::payroll::Payroll;
use crate::utils::audit::log_audit;

#[derive(Deserialize, ToSchema)]
pub struct CreatePayroll {
    #[schema(example = "EM-7F3A8C21C9-251006")]
    pub employee_id: String,

    #[schema(example = "2026-01-01", value_type = String, format = "date")]
    pub month: NaiveDate,

    #[schema(example = 50000.0)]
    pub base_salary: f64,

    #[schema(example = 5000.0)]
    pub bonus: f64,

    #[schema(example = 2000.0)]
    pub deductions: f64,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdatePayroll {
    #[schema(example = 52000.0)]
    pub base_salary: Option<f64>,

    #[schema(example = 6000.0)]
    pub bonus: Option<f64>,

    #[schema(example = 2500.0)]
    pub deductions: Option<f64>,
}

#[derive(sqlx::FromRow)]
struct PayrollAmounts {
    base_salary: f64,
    bonus: f64,
    deductions: f64,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PayrollQuery {
    #[schema(example = 1)]
    pub page: Option<u32>,

    #[schema(example = 10)]
    pub per_page: Option<u32>,

    #[schema(example = "EM-7F3A8C21C9-251006")]
    pub employee_id: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedPayrollResponse {
    pub data: Vec<Payroll>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

#[utoipa::path(
    post,
    path = "/api/v1/payroll",
    request_body = CreatePayroll,
    responses(
        (status = 201, description = "Payroll created"),
        (status = 400, description = "Employee not found"),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn create_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreatePayroll>,
) -> actix_web::Result<impl Responder> {
    auth.require_salary_role()?;

    let employee_id = payload.employee_id.trim().to_uppercase();

    if !crate::api::employee::employee_exists(&employee_id, pool.get_ref()).await {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Employee not found"
        })));
    }

    let net_salary = payload.base_salary + payload.bonus - payload.deductions;

    sqlx::query(
        r#"
        INSERT INTO payroll
        (employee_id, month, base_salary, bonus, deductions, net_salary)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&employee_id)
    .bind(payload.month)
    .bind(payload.base_salary)
    .bind(payload.bonus)
    .bind(payload.deductions)
    .bind(net_salary)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to create payroll");
        ErrorInternalServerError("Internal Server Error")
    })?;

    log_audit(
        pool.get_ref(),
        "Payroll",
        &employee_id,
        "CREATE",
        auth.employee_id.as_deref().unwrap_or(&auth.username),
        Some(&format!("Payroll generated for {}", payload.month)),
    )
    .await;

    Ok(HttpResponse::Created().json(json!({
        "message": "Payroll created successfully"
    })))
}

#[utoipa::path(
    put,
    path = "/api/v1/payroll/{payroll_id}",
    request_body = UpdatePayroll,
    params(
        ("payroll_id", description = "Payroll ID")
    ),
    responses(
        (status = 200, description = "Payroll updated"),
        (status = 404, description = "Payroll not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn update_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdatePayroll>,
) -> actix_web::Result<impl Responder> {
    auth.require_salary_role()?;

    let payroll_id = path.into_inner();

    let current = sqlx::query_as::<_, PayrollAmounts>(
        r#"
        SELECT base_salary, bonus, deductions
        FROM payroll
        WHERE id = ?
        "#,
    )
    .bind(payroll_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, payroll_id, "Failed to fetch payroll");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let current = match current {
        Some(c) => c,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Payroll record not found"
            })));
        }
    };

    let base_salary = body.base_salary.unwrap_or(current.base_salary);
    let bonus = body.bonus.unwrap_or(current.bonus);
    let deductions = body.deductions.unwrap_or(current.deductions);
    let net_salary = base_salary + bonus - deductions;

    sqlx::query(
        r#"
        UPDATE payroll
        SET base_salary = ?, bonus = ?, deductions = ?, net_salary = ?
        WHERE id = ?
        "#,
    )
    .bind(base_salary)
    .bind(bonus)
    .bind(deductions)
    .bind(net_salary)
    .bind(payroll_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, payroll_id, "Failed to update payroll");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Payroll updated successfully"
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/payroll/{payroll_id}",
    params(
        ("payroll_id", description = "Payroll ID")
    ),
    responses(
        (status = 200, body = Payroll),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn get_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_salary_role()?;

    let payroll_id = path.into_inner();

    let payroll = sqlx::query_as::<_, Payroll>(
        r#"
        SELECT id, employee_id, month, base_salary, bonus, deductions, net_salary
        FROM payroll
        WHERE id = ?
        "#,
    )
    .bind(payroll_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, payroll_id, "Failed to fetch payroll");
        ErrorInternalServerError("Internal Server Error")
    })?;

    match payroll {
        Some(p) => Ok(HttpResponse::Ok().json(p)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Payroll not found"
        }))),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/payroll",
    params(PayrollQuery),
    responses(
        (status = 200, body = PaginatedPayrollResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn list_payrolls(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<PayrollQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_salary_role()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let employee_filter = query
        .employee_id
        .as_deref()
        .map(|id| id.trim().to_uppercase());

    let (count_sql, data_sql) = match employee_filter {
        Some(_) => (
            "SELECT COUNT(*) FROM payroll WHERE employee_id = ?",
            r#"
            SELECT id, employee_id, month, base_salary, bonus, deductions, net_salary
            FROM payroll
            WHERE employee_id = ?
            ORDER BY month DESC
            LIMIT ? OFFSET ?
            "#,
        ),
        None => (
            "SELECT COUNT(*) FROM payroll",
            r#"
            SELECT id, employee_id, month, base_salary, bonus, deductions, net_salary
            FROM payroll
            ORDER BY month DESC
            LIMIT ? OFFSET ?
            "#,
        ),
    };

    let mut count_q = sqlx::query_scalar::<_, i64>(count_sql);
    if let Some(id) = &employee_filter {
        count_q = count_q.bind(id);
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count payrolls");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let mut data_q = sqlx::query_as::<_, Payroll>(data_sql);
    if let Some(id) = &employee_filter {
        data_q = data_q.bind(id);
    }

    let data = data_q
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch payroll list");
            ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(PaginatedPayrollResponse {
        data,
        page,
        per_page,
        total,
    }))
}
