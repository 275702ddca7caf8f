use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveRequest {
    pub id: u64,
    pub employee_id: String,
    #[schema(example = "2026-01-01", value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", value_type = String, format = "date")]
    pub end_date: NaiveDate,
    #[schema(example = "sick")]
    pub leave_type: String,
    pub reason: Option<String>,
    /// Pending / Approved / Rejected
    #[schema(example = "Pending")]
    pub status: String,
    /// First-level approver (the submitter's manager)
    pub approver_l1: Option<String>,
    /// Second-level approver (the manager's manager)
    pub approver_l2: Option<String>,
    pub review_comment: Option<String>,
    #[schema(example = "2026-01-01T00:00:00Z", value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}
