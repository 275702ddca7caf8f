use crate::{
    auth::auth::AuthUser,
    model::request::WorkflowRequest,
    perm::{resolve_role, RecordRef, RecordStatus, RowAction},
    utils::audit::log_audit,
};
use actix_web::{error::ErrorInternalServerError, web, HttpResponse, Responder};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Serialize, Deserialize, ToSchema, Display)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    #[display(fmt = "attendance")]
    Attendance,
    #[display(fmt = "leave")]
    Leave,
    #[display(fmt = "project")]
    Project,
    #[display(fmt = "salary")]
    Salary,
}

#[derive(Serialize, Deserialize, ToSchema, Display)]
#[serde(rename_all = "lowercase")]
pub enum RequestAction {
    #[display(fmt = "approve")]
    Approve,
    #[display(fmt = "reject")]
    Reject,
    #[display(fmt = "reassign")]
    Reassign,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateRequest {
    #[schema(example = "salary")]
    pub request_type: RequestType,
    /// Approver the request lands with
    #[schema(example = "EM-1B9E0D44A2-250101")]
    pub assigned_to: String,
    #[schema(example = "Advance salary for January", nullable = true)]
    pub comment: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ActOnRequest {
    pub action: RequestAction,
    /// Required when rejecting; optional otherwise
    #[schema(example = "No budget this month", nullable = true)]
    pub comment: Option<String>,
    /// New approver; required when reassigning
    #[schema(example = "EM-9C2D1E77B0-250315", nullable = true)]
    pub assigned_to: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct RequestFilter {
    /// Requests created by this employee
    pub employee_id: Option<String>,
    /// Requests waiting on this approver
    pub assigned_to: Option<String>,
    #[schema(example = "Pending")]
    pub status: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct RequestListResponse {
    pub data: Vec<WorkflowRequest>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    employee_id: String,
    status: String,
    owner_role: Option<String>,
}

async fn fetch_review_row(pool: &MySqlPool, id: u64) -> Result<Option<ReviewRow>, sqlx::Error> {
    sqlx::query_as::<_, ReviewRow>(
        r#"
        SELECT r.employee_id, r.status, e.role AS owner_role
        FROM requests r
        LEFT JOIN employees e ON e.id = r.employee_id
        WHERE r.id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

fn record_ref<'a>(row: &'a ReviewRow) -> Option<RecordRef<'a>> {
    let status: RecordStatus = row.status.parse().ok()?;
    Some(RecordRef {
        status,
        owner_role: resolve_role(row.owner_role.as_deref()),
        owner_id: &row.employee_id,
    })
}

/* =========================
Create request
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/request",
    request_body = CreateRequest,
    responses(
        (status = 200, description = "Request submitted", body = Object, example = json!({
            "message": "Request submitted",
            "status": "Pending"
        })),
        (status = 400, description = "Assignee not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Request"
)]
pub async fn create_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateRequest>,
) -> actix_web::Result<impl Responder> {
    let own_id = auth
        .employee_id
        .clone()
        .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))?;

    let assigned_to = payload.assigned_to.trim().to_uppercase();

    if !crate::api::employee::employee_exists(&assigned_to, pool.get_ref()).await {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Assignee not found"
        })));
    }

    sqlx::query(
        r#"
        INSERT INTO requests (request_type, employee_id, assigned_to, status, comment)
        VALUES (?, ?, ?, 'Pending', ?)
        "#,
    )
    .bind(payload.request_type.to_string())
    .bind(&own_id)
    .bind(&assigned_to)
    .bind(&payload.comment)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to create request");
        ErrorInternalServerError("Internal Server Error")
    })?;

    log_audit(
        pool.get_ref(),
        "Request",
        &own_id,
        "CREATE",
        &own_id,
        payload.comment.as_deref(),
    )
    .await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Request submitted",
        "status": "Pending"
    })))
}

/* =========================
Act on request (approve / reject / reassign)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/request/{request_id}/act",
    params(
        ("request_id" = u64, Path, description = "Request id")
    ),
    request_body = ActOnRequest,
    responses(
        (status = 200, description = "Action applied"),
        (status = 400, description = "Not found, already processed, or missing fields"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Request"
)]
pub async fn act_on_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<ActOnRequest>,
) -> actix_web::Result<impl Responder> {
    let request_id = path.into_inner();

    let row = fetch_review_row(pool.get_ref(), request_id)
        .await
        .map_err(|e| {
            error!(error = %e, request_id, "Failed to fetch request");
            ErrorInternalServerError("Internal Server Error")
        })?;

    let Some(row) = row else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Request not found"
        })));
    };

    let actor = auth
        .employee_id
        .clone()
        .unwrap_or_else(|| auth.username.clone());

    match payload.action {
        RequestAction::Approve | RequestAction::Reject => {
            let row_action = match payload.action {
                RequestAction::Approve => RowAction::Approve,
                _ => RowAction::Reject,
            };

            let comment = payload.comment.as_deref().map(str::trim);
            if matches!(payload.action, RequestAction::Reject)
                && comment.unwrap_or("").is_empty()
            {
                return Ok(HttpResponse::BadRequest().json(json!({
                    "message": "Review comment is required to reject"
                })));
            }

            let allowed = record_ref(&row)
                .map(|record| auth.ctx().with_record(record).allows(row_action))
                .unwrap_or(false);

            if !allowed {
                return Err(actix_web::error::ErrorForbidden(
                    "You cannot act on this request",
                ));
            }

            let new_status = match payload.action {
                RequestAction::Approve => RecordStatus::Approved,
                _ => RecordStatus::Rejected,
            };

            let result = sqlx::query(
                r#"
                UPDATE requests
                SET status = ?, comment = COALESCE(?, comment)
                WHERE id = ?
                AND status = 'Pending'
                "#,
            )
            .bind(new_status.as_str())
            .bind(comment)
            .bind(request_id)
            .execute(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, request_id, "Failed to act on request");
                ErrorInternalServerError("Internal Server Error")
            })?;

            if result.rows_affected() == 0 {
                return Ok(HttpResponse::BadRequest().json(json!({
                    "message": "Request not found or already processed"
                })));
            }

            log_audit(
                pool.get_ref(),
                "Request",
                &row.employee_id,
                &payload.action.to_string().to_uppercase(),
                &actor,
                comment,
            )
            .await;

            Ok(HttpResponse::Ok().json(json!({
                "message": format!("Request {}", new_status.as_str().to_lowercase())
            })))
        }

        RequestAction::Reassign => {
            // Reassignment keeps the request Pending; it just moves the
            // inbox it sits in.
            let allowed = record_ref(&row)
                .map(|record| auth.ctx().with_record(record).allows(RowAction::Edit))
                .unwrap_or(false);

            if !allowed {
                return Err(actix_web::error::ErrorForbidden(
                    "You cannot reassign this request",
                ));
            }

            let Some(assigned_to) = payload
                .assigned_to
                .as_deref()
                .map(|id| id.trim().to_uppercase())
            else {
                return Ok(HttpResponse::BadRequest().json(json!({
                    "message": "assigned_to is required to reassign"
                })));
            };

            if !crate::api::employee::employee_exists(&assigned_to, pool.get_ref()).await {
                return Ok(HttpResponse::BadRequest().json(json!({
                    "message": "Assignee not found"
                })));
            }

            let result = sqlx::query(
                r#"
                UPDATE requests
                SET assigned_to = ?
                WHERE id = ?
                AND status = 'Pending'
                "#,
            )
            .bind(&assigned_to)
            .bind(request_id)
            .execute(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, request_id, "Failed to reassign request");
                ErrorInternalServerError("Internal Server Error")
            })?;

            if result.rows_affected() == 0 {
                return Ok(HttpResponse::BadRequest().json(json!({
                    "message": "Request not found or already processed"
                })));
            }

            log_audit(
                pool.get_ref(),
                "Request",
                &row.employee_id,
                "REASSIGN",
                &actor,
                Some(&format!("Reassigned to {}", assigned_to)),
            )
            .await;

            Ok(HttpResponse::Ok().json(json!({
                "message": "Request reassigned"
            })))
        }
    }
}

/* =========================
List requests
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/request",
    params(RequestFilter),
    responses(
        (status = 200, description = "Paginated request list", body = RequestListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Request"
)]
pub async fn request_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<RequestFilter>,
) -> actix_web::Result<impl Responder> {
    let own_id = auth
        .employee_id
        .clone()
        .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))?;

    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<String> = Vec::new();

    let employee_filter = query
        .employee_id
        .as_deref()
        .map(|id| id.trim().to_uppercase());
    let assignee_filter = query
        .assigned_to
        .as_deref()
        .map(|id| id.trim().to_uppercase());

    // With no explicit filter this is the caller's approval inbox.
    let (employee_filter, assignee_filter) = match (employee_filter, assignee_filter) {
        (None, None) => (None, Some(own_id.clone())),
        other => other,
    };

    if let Some(employee_id) = &employee_filter {
        if *employee_id != own_id {
            let target_role = crate::api::employee::employee_role(employee_id, pool.get_ref())
                .await
                .map_err(|e| {
                    error!(error = %e, employee_id, "Failed to fetch employee");
                    ErrorInternalServerError("Internal Server Error")
                })?;

            match target_role {
                None => {
                    return Ok(HttpResponse::NotFound().json(json!({
                        "message": "Employee not found"
                    })));
                }
                Some(role) => auth.require_scope_over(role)?,
            }
        }

        where_sql.push_str(" AND employee_id = ?");
        args.push(employee_id.clone());
    }

    if let Some(assigned_to) = &assignee_filter {
        if *assigned_to != own_id {
            let target_role = crate::api::employee::employee_role(assigned_to, pool.get_ref())
                .await
                .map_err(|e| {
                    error!(error = %e, assigned_to, "Failed to fetch employee");
                    ErrorInternalServerError("Internal Server Error")
                })?;

            match target_role {
                None => {
                    return Ok(HttpResponse::NotFound().json(json!({
                        "message": "Employee not found"
                    })));
                }
                Some(role) => auth.require_scope_over(role)?,
            }
        }

        where_sql.push_str(" AND assigned_to = ?");
        args.push(assigned_to.clone());
    }

    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND status = ?");
        args.push(status.to_string());
    }

    let count_sql = format!("SELECT COUNT(*) FROM requests{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = count_q.bind(arg);
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count requests");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        r#"
        SELECT id, request_type, employee_id, assigned_to, status, comment,
               created_at, updated_at
        FROM requests
        {}
        ORDER BY created_at DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, WorkflowRequest>(&data_sql);
    for arg in &args {
        data_q = data_q.bind(arg);
    }

    let data = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch request list");
            ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(RequestListResponse {
        data,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}
