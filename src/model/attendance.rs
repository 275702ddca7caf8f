use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Attendance {
    pub id: u64,
    pub employee_id: String,
    #[schema(example = "2026-01-01", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "09:00:00", value_type = String)]
    pub time_in: NaiveTime,
    #[schema(example = "18:00:00", value_type = String)]
    pub time_out: NaiveTime,
    pub hours_worked: i64,
    pub overtime_hours: i64,
    /// Pending / Approved / Rejected
    #[schema(example = "Pending")]
    pub status: String,
    pub approved_by: Option<String>,
    pub review_comment: Option<String>,
}
