use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AuditLog {
    pub id: u64,
    /// e.g. "Attendance", "Leave", "Employee", "Request"
    #[schema(example = "Attendance")]
    pub entity_type: String,
    pub entity_id: String,
    /// e.g. CREATE, UPDATE, DELETE, APPROVE, REJECT
    #[schema(example = "APPROVE")]
    pub action: String,
    pub performed_by: String,
    pub comment: Option<String>,
    #[schema(example = "2026-01-01T00:00:00Z", value_type = String, format = "date-time")]
    pub timestamp: Option<DateTime<Utc>>,
}
