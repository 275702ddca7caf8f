use crate::auth::auth::AuthUser;
use crate::model::audit::AuditLog;
use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AuditQuery {
    #[schema(example = 1)]
    pub page: Option<u64>,
    #[schema(example = 10)]
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct AuditListResponse {
    pub data: Vec<AuditLog>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// Full audit trail, newest first (MD/PD only)
#[utoipa::path(
    get,
    path = "/api/v1/audit",
    params(AuditQuery),
    responses(
        (status = 200, description = "Paginated audit log", body = AuditListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Audit"
)]
pub async fn list_audits(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AuditQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_audit_role()?;

    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM audit_logs")
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to count audit logs");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let data = sqlx::query_as::<_, AuditLog>(
        r#"
        SELECT id, entity_type, entity_id, action, performed_by, comment, timestamp
        FROM audit_logs
        ORDER BY timestamp DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(per_page)
    .bind(offset)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch audit logs");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(AuditListResponse {
        data,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

/// Audit rows for one entity (MD/PD only)
#[utoipa::path(
    get,
    path = "/api/v1/audit/{entity_type}/{entity_id}",
    params(
        ("entity_type" = String, Path, description = "Entity kind, e.g. Attendance"),
        ("entity_id" = String, Path, description = "Entity id")
    ),
    responses(
        (status = 200, description = "Audit rows for the entity", body = [AuditLog]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Audit"
)]
pub async fn audits_by_entity(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(String, String)>,
) -> actix_web::Result<impl Responder> {
    auth.require_audit_role()?;

    let (entity_type, entity_id) = path.into_inner();

    let data = sqlx::query_as::<_, AuditLog>(
        r#"
        SELECT id, entity_type, entity_id, action, performed_by, comment, timestamp
        FROM audit_logs
        WHERE entity_type = ? AND entity_id = ?
        ORDER BY timestamp DESC
        "#,
    )
    .bind(&entity_type)
    .bind(&entity_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, entity_type, entity_id, "Failed to fetch entity audits");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(data))
}
