use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A generic workflow request (advance salary, attendance correction,
/// project assignment) routed to an approver.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct WorkflowRequest {
    pub id: u64,
    /// attendance / leave / project / salary
    #[schema(example = "salary")]
    pub request_type: String,
    pub employee_id: String,
    pub assigned_to: Option<String>,
    /// Pending / Approved / Rejected
    #[schema(example = "Pending")]
    pub status: String,
    pub comment: Option<String>,
    #[schema(example = "2026-01-01T00:00:00Z", value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
    #[schema(example = "2026-01-01T00:00:00Z", value_type = String, format = "date-time", nullable = true)]
    pub updated_at: Option<DateTime<Utc>>,
}
