use crate::{
    auth::auth::AuthUser,
    model::leave_request::LeaveRequest,
    perm::{resolve_role, RecordRef, RecordStatus, Role, RowAction},
    utils::audit::log_audit,
};
use actix_web::{error::ErrorInternalServerError, web, HttpResponse, Responder};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LeaveType {
    Annual,
    Sick,
    Unpaid,
}

impl LeaveType {
    fn as_str(&self) -> &str {
        match self {
            LeaveType::Annual => "annual",
            LeaveType::Sick => "sick",
            LeaveType::Unpaid => "unpaid",
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    /// Defaults to the caller's own employee id
    #[schema(example = "EM-7F3A8C21C9-251006", nullable = true)]
    pub employee_id: Option<String>,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "sick")]
    pub leave_type: LeaveType, // enum ensures Swagger dropdown
    #[schema(example = "Fever", nullable = true)]
    pub reason: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct RejectLeave {
    /// Required; the reject dialog always carries a review comment
    #[schema(example = "Project deadline that week")]
    pub review_comment: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    /// Filter by employee ID
    pub employee_id: Option<String>,
    #[schema(example = "Pending")]
    /// Filter by leave status
    pub status: Option<String>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>, // 1-based
    #[schema(example = 3)]
    /// Pagination per page number
    pub per_page: Option<u64>, // items per page
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
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
        SELECT l.employee_id, l.status, e.role AS owner_role
        FROM leaves l
        LEFT JOIN employees e ON e.id = l.employee_id
        WHERE l.id = ?
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

async fn manager_of(pool: &MySqlPool, employee_id: &str) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, Option<String>>("SELECT manager_id FROM employees WHERE id = ?")
        .bind(employee_id)
        .fetch_optional(pool)
        .await
        .map(|row| row.flatten())
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave request submitted successfully",
         body = Object,
         example = json!({
            "message": "Leave request submitted",
            "status": "Pending"
         })
        ),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let own_id = auth
        .employee_id
        .clone()
        .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))?;

    let employee_id = payload
        .employee_id
        .as_deref()
        .map(|id| id.trim().to_uppercase())
        .unwrap_or_else(|| own_id.clone());

    if employee_id != own_id {
        let target_role = crate::api::employee::employee_role(&employee_id, pool.get_ref())
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

    // 1. validate dates
    if payload.start_date > payload.end_date {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "start_date cannot be after end_date"
        })));
    }

    // 2. resolve the approver chain: L1 the manager, L2 the manager's
    // manager. MD/PD submissions are approved on the spot.
    let (status, approver_l1, approver_l2) = if matches!(auth.role, Role::Md | Role::Pd) {
        (RecordStatus::Approved, None, Some(own_id.clone()))
    } else {
        let l1 = manager_of(pool.get_ref(), &employee_id).await.map_err(|e| {
            error!(error = %e, employee_id, "Failed to fetch manager chain");
            ErrorInternalServerError("Internal Server Error")
        })?;

        let l2 = match l1.as_deref() {
            Some(manager_id) => manager_of(pool.get_ref(), manager_id).await.map_err(|e| {
                error!(error = %e, manager_id, "Failed to fetch manager chain");
                ErrorInternalServerError("Internal Server Error")
            })?,
            None => None,
        };

        (RecordStatus::Pending, l1, l2)
    };

    // 3. insert request
    sqlx::query(
        r#"
        INSERT INTO leaves
            (employee_id, start_date, end_date, leave_type, reason, status, approver_l1, approver_l2)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&employee_id)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.leave_type.as_str())
    .bind(&payload.reason)
    .bind(status.as_str())
    .bind(&approver_l1)
    .bind(&approver_l2)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to create leave request");
        ErrorInternalServerError("Internal Server Error")
    })?;

    log_audit(
        pool.get_ref(),
        "Leave",
        &employee_id,
        "CREATE",
        &own_id,
        Some(&format!(
            "Leave requested for {} with status '{}'",
            employee_id, status
        )),
    )
    .await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave request submitted",
        "status": status.as_str()
    })))
}

/* =========================
Approve leave
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved successfully", body = Object, example = json!({
            "message": "Leave approved"
        })),
        (status = 400, description = "Leave request not found or already processed", body = Object, example = json!({
            "message": "Leave request not found or already processed"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let row = fetch_review_row(pool.get_ref(), leave_id).await.map_err(|e| {
        error!(error = %e, leave_id, "Failed to fetch leave request");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let Some(row) = row else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Leave request not found"
        })));
    };

    let allowed = record_ref(&row)
        .map(|record| auth.ctx().with_record(record).allows(RowAction::Approve))
        .unwrap_or(false);

    if !allowed {
        return Err(actix_web::error::ErrorForbidden(
            "You cannot approve this request",
        ));
    }

    let result = sqlx::query(
        r#"
        UPDATE leaves
        SET status = 'Approved'
        WHERE id = ?
        AND status = 'Pending'
        "#,
    )
    .bind(leave_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, leave_id, "Approve leave failed");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Leave request not found or already processed"
        })));
    }

    log_audit(
        pool.get_ref(),
        "Leave",
        &row.employee_id,
        "APPROVE",
        auth.employee_id.as_deref().unwrap_or(&auth.username),
        Some(&format!("Leave {} approved", leave_id)),
    )
    .await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave approved"
    })))
}

/* =========================
Reject leave (comment required)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    request_body = RejectLeave,
    responses(
        (status = 200, description = "Leave rejected successfully", body = Object, example = json!({
            "message": "Leave rejected"
        })),
        (status = 400, description = "Missing comment, not found or already processed", body = Object, example = json!({
            "message": "Leave request not found or already processed"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<RejectLeave>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let review_comment = payload.review_comment.trim();
    if review_comment.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Review comment is required to reject"
        })));
    }

    let row = fetch_review_row(pool.get_ref(), leave_id).await.map_err(|e| {
        error!(error = %e, leave_id, "Failed to fetch leave request");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let Some(row) = row else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Leave request not found"
        })));
    };

    let allowed = record_ref(&row)
        .map(|record| auth.ctx().with_record(record).allows(RowAction::Reject))
        .unwrap_or(false);

    if !allowed {
        return Err(actix_web::error::ErrorForbidden(
            "You cannot reject this request",
        ));
    }

    let result = sqlx::query(
        r#"
        UPDATE leaves
        SET status = 'Rejected', review_comment = ?
        WHERE id = ?
        AND status = 'Pending'
        "#,
    )
    .bind(review_comment)
    .bind(leave_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, leave_id, "Reject leave failed");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Leave request not found or already processed"
        })));
    }

    log_audit(
        pool.get_ref(),
        "Leave",
        &row.employee_id,
        "REJECT",
        auth.employee_id.as_deref().unwrap_or(&auth.username),
        Some(review_comment),
    )
    .await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave rejected"
    })))
}

/* =========================
Delete leave (Pending only)
========================= */
#[utoipa::path(
    delete,
    path = "/api/v1/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to delete")
    ),
    responses(
        (status = 200, description = "Leave deleted"),
        (status = 400, description = "Not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn delete_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let row = fetch_review_row(pool.get_ref(), leave_id).await.map_err(|e| {
        error!(error = %e, leave_id, "Failed to fetch leave request");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let Some(row) = row else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Leave request not found"
        })));
    };

    let allowed = record_ref(&row)
        .map(|record| auth.ctx().with_record(record).allows(RowAction::Delete))
        .unwrap_or(false);

    if !allowed {
        return Err(actix_web::error::ErrorForbidden(
            "You cannot delete this request",
        ));
    }

    let result = sqlx::query(
        r#"
        DELETE FROM leaves
        WHERE id = ?
        AND status = 'Pending'
        "#,
    )
    .bind(leave_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, leave_id, "Delete leave failed");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Leave request not found or already processed"
        })));
    }

    log_audit(
        pool.get_ref(),
        "Leave",
        &row.employee_id,
        "DELETE",
        auth.employee_id.as_deref().unwrap_or(&auth.username),
        Some(&format!("Leave {} deleted", leave_id)),
    )
    .await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave deleted"
    })))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "Leave request not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let leave = sqlx::query_as::<_, LeaveRequest>(
        r#"
        SELECT id, employee_id, start_date, end_date, leave_type, reason,
               status, approver_l1, approver_l2, review_comment, created_at
        FROM leaves
        WHERE id = ?
        "#,
    )
    .bind(leave_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, leave_id, "Failed to fetch leave request");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let leave = match leave {
        Some(l) => l,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Leave request not found"
            })));
        }
    };

    // own requests are always visible; anyone else's must be in scope
    let is_self = auth.employee_id.as_deref() == Some(leave.employee_id.as_str());
    if !is_self {
        let owner_role = crate::api::employee::employee_role(&leave.employee_id, pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch employee");
                ErrorInternalServerError("Internal Server Error")
            })?
            .unwrap_or(Role::Employee);
        auth.require_scope_over(owner_role)?;
    }

    Ok(HttpResponse::Ok().json(leave))
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    let own_id = auth
        .employee_id
        .clone()
        .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))?;

    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let employee_id = query
        .employee_id
        .as_deref()
        .map(|id| id.trim().to_uppercase())
        .unwrap_or_else(|| own_id.clone());

    if employee_id != own_id {
        let target_role = crate::api::employee::employee_role(&employee_id, pool.get_ref())
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

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut where_sql = String::from(" WHERE employee_id = ?");
    let mut args: Vec<String> = vec![employee_id];

    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND status = ?");
        args.push(status.to_string());
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM leaves{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = count_q.bind(arg);
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count leave requests");
        ErrorInternalServerError("Internal Server Error")
    })?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        r#"
        SELECT id, employee_id, start_date, end_date, leave_type, reason,
               status, approver_l1, approver_l2, review_comment, created_at
        FROM leaves
        {}
        ORDER BY created_at DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, LeaveRequest>(&data_sql);
    for arg in &args {
        data_q = data_q.bind(arg);
    }

    let leaves = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch leave list");
            ErrorInternalServerError("Internal Server Error")
        })?;

    // -------------------------
    // Response
    // -------------------------
    let response = LeaveListResponse {
        data: leaves,
        page: page as u32,
        per_page: per_page as u32,
        total,
    };

    Ok(HttpResponse::Ok().json(response))
}
