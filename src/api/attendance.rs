use crate::{
    auth::auth::AuthUser,
    model::attendance::Attendance,
    perm::{resolve_role, RecordRef, RecordStatus, Role, RowAction},
    utils::audit::log_audit,
};
use actix_web::{error::ErrorInternalServerError, web, HttpResponse, Responder};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

/// Whole hours between two clock times on the same day.
fn hours_worked(time_in: NaiveTime, time_out: NaiveTime) -> i64 {
    (time_out - time_in).num_seconds() / 3600
}

/// Anything past an eight-hour day counts as overtime.
fn overtime_hours(hours: i64) -> i64 {
    (hours - 8).max(0)
}

#[derive(Deserialize, ToSchema)]
pub struct AddAttendance {
    /// Defaults to the caller's own employee id
    #[schema(example = "EM-7F3A8C21C9-251006", nullable = true)]
    pub employee_id: Option<String>,
    #[schema(example = "2026-01-01", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "09:00:00", value_type = String)]
    pub time_in: NaiveTime,
    #[schema(example = "18:00:00", value_type = String)]
    pub time_out: NaiveTime,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateAttendance {
    #[schema(example = "09:30:00", value_type = String)]
    pub time_in: NaiveTime,
    #[schema(example = "18:30:00", value_type = String)]
    pub time_out: NaiveTime,
}

#[derive(Deserialize, ToSchema)]
pub struct RejectAttendance {
    /// Required; the reject dialog always carries a review comment
    #[schema(example = "Time entries do not match the gate log")]
    pub review_comment: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AttendanceFilter {
    pub employee_id: Option<String>,
    #[schema(example = "Pending")]
    pub status: Option<String>,
    #[schema(example = 2026)]
    pub year: Option<i32>,
    #[schema(example = 1)]
    pub month: Option<u32>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub data: Vec<Attendance>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

// Helper enum for typed SQLx binding
enum FilterValue {
    I64(i64),
    Str(String),
}

/// Attendance row plus the submitter's role, as the resolver sees it.
#[derive(sqlx::FromRow)]
struct ReviewRow {
    employee_id: String,
    status: String,
    owner_role: Option<String>,
}

async fn fetch_review_row(pool: &MySqlPool, id: u64) -> Result<Option<ReviewRow>, sqlx::Error> {
    sqlx::query_as::<_, ReviewRow>(
        r#"
        SELECT a.employee_id, a.status, e.role AS owner_role
        FROM attendance a
        LEFT JOIN employees e ON e.id = a.employee_id
        WHERE a.id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// A row whose status string does not parse is treated as locked.
fn record_ref<'a>(row: &'a ReviewRow) -> Option<RecordRef<'a>> {
    let status: RecordStatus = row.status.parse().ok()?;
    Some(RecordRef {
        status,
        owner_role: resolve_role(row.owner_role.as_deref()),
        owner_id: &row.employee_id,
    })
}

/* =========================
Add attendance (self or subordinate)
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/attendance",
    request_body = AddAttendance,
    responses(
        (status = 200, description = "Attendance recorded", body = Object, example = json!({
            "message": "Attendance recorded",
            "status": "Pending"
        })),
        (status = 400, description = "Duplicate entry or invalid time range"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn add_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<AddAttendance>,
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

    // Entries for somebody else need that somebody inside the
    // caller's scope.
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

    if payload.time_in >= payload.time_out {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Invalid time range: 'Time In' must be earlier than 'Time Out'."
        })));
    }

    let duplicate = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM attendance WHERE employee_id = ? AND date = ? LIMIT 1)",
    )
    .bind(&employee_id)
    .bind(payload.date)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Duplicate check failed");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if duplicate {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": format!(
                "Duplicate Attendance Error: Employee {} already has an attendance record for {}",
                employee_id, payload.date
            )
        })));
    }

    let hours = hours_worked(payload.time_in, payload.time_out);
    let overtime = overtime_hours(hours);

    // MD/PD entries skip review entirely.
    let (status, approved_by) = if matches!(auth.role, Role::Md | Role::Pd) {
        (RecordStatus::Approved, Some(own_id.clone()))
    } else {
        (RecordStatus::Pending, None)
    };

    sqlx::query(
        r#"
        INSERT INTO attendance
            (employee_id, date, time_in, time_out, hours_worked, overtime_hours, status, approved_by)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&employee_id)
    .bind(payload.date)
    .bind(payload.time_in)
    .bind(payload.time_out)
    .bind(hours)
    .bind(overtime)
    .bind(status.as_str())
    .bind(&approved_by)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to create attendance");
        ErrorInternalServerError("Internal Server Error")
    })?;

    log_audit(
        pool.get_ref(),
        "Attendance",
        &employee_id,
        "CREATE",
        &own_id,
        Some(&format!(
            "Attendance created for employee {} with status '{}'",
            employee_id, status
        )),
    )
    .await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Attendance recorded",
        "status": status.as_str()
    })))
}

/* =========================
Edit attendance (Pending only)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/attendance/{attendance_id}",
    params(
        ("attendance_id" = u64, Path, description = "Attendance record id")
    ),
    request_body = UpdateAttendance,
    responses(
        (status = 200, description = "Attendance updated"),
        (status = 400, description = "Record not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn update_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateAttendance>,
) -> actix_web::Result<impl Responder> {
    let attendance_id = path.into_inner();

    if payload.time_in >= payload.time_out {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Invalid time range: 'Time In' must be earlier than 'Time Out'."
        })));
    }

    let row = fetch_review_row(pool.get_ref(), attendance_id)
        .await
        .map_err(|e| {
            error!(error = %e, attendance_id, "Failed to fetch attendance");
            ErrorInternalServerError("Internal Server Error")
        })?;

    let Some(row) = row else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Attendance record not found"
        })));
    };

    let allowed = record_ref(&row)
        .map(|record| auth.ctx().with_record(record).allows(RowAction::Edit))
        .unwrap_or(false);

    if !allowed {
        return Err(actix_web::error::ErrorForbidden(
            "Attendance record is not editable",
        ));
    }

    let hours = hours_worked(payload.time_in, payload.time_out);
    let overtime = overtime_hours(hours);

    let result = sqlx::query(
        r#"
        UPDATE attendance
        SET time_in = ?, time_out = ?, hours_worked = ?, overtime_hours = ?
        WHERE id = ?
        AND status = 'Pending'
        "#,
    )
    .bind(payload.time_in)
    .bind(payload.time_out)
    .bind(hours)
    .bind(overtime)
    .bind(attendance_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, attendance_id, "Failed to update attendance");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Attendance record not found or already processed"
        })));
    }

    log_audit(
        pool.get_ref(),
        "Attendance",
        &row.employee_id,
        "UPDATE",
        auth.employee_id.as_deref().unwrap_or(&auth.username),
        Some(&format!("Attendance {} updated", attendance_id)),
    )
    .await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Attendance updated"
    })))
}

/* =========================
Approve attendance
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/attendance/{attendance_id}/approve",
    params(
        ("attendance_id" = u64, Path, description = "Attendance record id")
    ),
    responses(
        (status = 200, description = "Attendance approved", body = Object, example = json!({
            "message": "Attendance approved"
        })),
        (status = 400, description = "Record not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn approve_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let attendance_id = path.into_inner();

    let row = fetch_review_row(pool.get_ref(), attendance_id)
        .await
        .map_err(|e| {
            error!(error = %e, attendance_id, "Failed to fetch attendance");
            ErrorInternalServerError("Internal Server Error")
        })?;

    let Some(row) = row else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Attendance record not found"
        })));
    };

    let allowed = record_ref(&row)
        .map(|record| auth.ctx().with_record(record).allows(RowAction::Approve))
        .unwrap_or(false);

    if !allowed {
        return Err(actix_web::error::ErrorForbidden(
            "You cannot approve this record",
        ));
    }

    let approver = auth.employee_id.as_deref().unwrap_or(&auth.username);

    let result = sqlx::query(
        r#"
        UPDATE attendance
        SET status = 'Approved', approved_by = ?
        WHERE id = ?
        AND status = 'Pending'
        "#,
    )
    .bind(approver)
    .bind(attendance_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, attendance_id, "Approve attendance failed");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Attendance record not found or already processed"
        })));
    }

    log_audit(
        pool.get_ref(),
        "Attendance",
        &row.employee_id,
        "APPROVE",
        approver,
        Some(&format!("Attendance {} approved", attendance_id)),
    )
    .await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Attendance approved"
    })))
}

/* =========================
Reject attendance (comment required)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/attendance/{attendance_id}/reject",
    params(
        ("attendance_id" = u64, Path, description = "Attendance record id")
    ),
    request_body = RejectAttendance,
    responses(
        (status = 200, description = "Attendance rejected", body = Object, example = json!({
            "message": "Attendance rejected"
        })),
        (status = 400, description = "Missing comment, record not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn reject_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<RejectAttendance>,
) -> actix_web::Result<impl Responder> {
    let attendance_id = path.into_inner();

    let review_comment = payload.review_comment.trim();
    if review_comment.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Review comment is required to reject"
        })));
    }

    let row = fetch_review_row(pool.get_ref(), attendance_id)
        .await
        .map_err(|e| {
            error!(error = %e, attendance_id, "Failed to fetch attendance");
            ErrorInternalServerError("Internal Server Error")
        })?;

    let Some(row) = row else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Attendance record not found"
        })));
    };

    let allowed = record_ref(&row)
        .map(|record| auth.ctx().with_record(record).allows(RowAction::Reject))
        .unwrap_or(false);

    if !allowed {
        return Err(actix_web::error::ErrorForbidden(
            "You cannot reject this record",
        ));
    }

    let approver = auth.employee_id.as_deref().unwrap_or(&auth.username);

    let result = sqlx::query(
        r#"
        UPDATE attendance
        SET status = 'Rejected', approved_by = ?, review_comment = ?
        WHERE id = ?
        AND status = 'Pending'
        "#,
    )
    .bind(approver)
    .bind(review_comment)
    .bind(attendance_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, attendance_id, "Reject attendance failed");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Attendance record not found or already processed"
        })));
    }

    log_audit(
        pool.get_ref(),
        "Attendance",
        &row.employee_id,
        "REJECT",
        approver,
        Some(review_comment),
    )
    .await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Attendance rejected"
    })))
}

/* =========================
Delete attendance (Pending only)
========================= */
#[utoipa::path(
    delete,
    path = "/api/v1/attendance/{attendance_id}",
    params(
        ("attendance_id" = u64, Path, description = "Attendance record id")
    ),
    responses(
        (status = 200, description = "Attendance deleted"),
        (status = 400, description = "Record not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn delete_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let attendance_id = path.into_inner();

    let row = fetch_review_row(pool.get_ref(), attendance_id)
        .await
        .map_err(|e| {
            error!(error = %e, attendance_id, "Failed to fetch attendance");
            ErrorInternalServerError("Internal Server Error")
        })?;

    let Some(row) = row else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Attendance record not found"
        })));
    };

    let allowed = record_ref(&row)
        .map(|record| auth.ctx().with_record(record).allows(RowAction::Delete))
        .unwrap_or(false);

    if !allowed {
        return Err(actix_web::error::ErrorForbidden(
            "You cannot delete this record",
        ));
    }

    let result = sqlx::query(
        r#"
        DELETE FROM attendance
        WHERE id = ?
        AND status = 'Pending'
        "#,
    )
    .bind(attendance_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, attendance_id, "Delete attendance failed");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Attendance record not found or already processed"
        })));
    }

    log_audit(
        pool.get_ref(),
        "Attendance",
        &row.employee_id,
        "DELETE",
        auth.employee_id.as_deref().unwrap_or(&auth.username),
        Some(&format!("Attendance {} deleted", attendance_id)),
    )
    .await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Attendance deleted"
    })))
}

/* =========================
List attendance
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/attendance",
    params(AttendanceFilter),
    responses(
        (status = 200, description = "Paginated attendance list", body = AttendanceListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn attendance_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceFilter>,
) -> actix_web::Result<impl Responder> {
    let own_id = auth
        .employee_id
        .clone()
        .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))?;

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
    let mut args: Vec<FilterValue> = vec![FilterValue::Str(employee_id)];

    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status.to_string()));
    }

    if let Some(year) = query.year {
        where_sql.push_str(" AND YEAR(date) = ?");
        args.push(FilterValue::I64(year as i64));
    }

    if let Some(month) = query.month {
        where_sql.push_str(" AND MONTH(date) = ?");
        args.push(FilterValue::I64(month as i64));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM attendance{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::I64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count attendance");
        ErrorInternalServerError("Internal Server Error")
    })?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        r#"
        SELECT id, employee_id, date, time_in, time_out, hours_worked,
               overtime_hours, status, approved_by, review_comment
        FROM attendance
        {}
        ORDER BY date DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, Attendance>(&data_sql);
    for arg in &args {
        data_q = match arg {
            FilterValue::I64(v) => data_q.bind(*v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let rows = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch attendance list");
            ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        data: rows,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn hours_are_floored_to_whole_hours() {
        assert_eq!(hours_worked(t(9, 0), t(18, 0)), 9);
        assert_eq!(hours_worked(t(9, 0), t(17, 59)), 8);
        assert_eq!(hours_worked(t(9, 30), t(10, 0)), 0);
    }

    #[test]
    fn overtime_starts_after_eight_hours() {
        assert_eq!(overtime_hours(8), 0);
        assert_eq!(overtime_hours(9), 1);
        assert_eq!(overtime_hours(4), 0);
    }

    #[test]
    fn unparseable_status_locks_the_row() {
        let row = ReviewRow {
            employee_id: "EM-1".into(),
            status: "Archived".into(),
            owner_role: Some("Employee".into()),
        };
        assert!(record_ref(&row).is_none());
    }
}
