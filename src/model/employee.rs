use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "serial_no": 1,
        "id": "EM-7F3A8C21C9-251006",
        "name": "John Doe",
        "role": "Employee",
        "manager_id": "EM-1B9E0D44A2-250101",
        "contact": "+919812345678",
        "aadhaar_number": "123412341234",
        "is_active": true,
        "salary_per_month": 50000.0,
        "overtime_charge_per_hour": 200.0,
        "deduct_per_hour": 150.0,
        "deduct_per_day": 1200.0
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub serial_no: u64,

    /// Unique prefixed employee id, e.g. "EM-7F3A8C21C9-251006"
    #[schema(example = "EM-7F3A8C21C9-251006")]
    pub id: String,

    #[schema(example = "John Doe")]
    pub name: String,

    /// Role name; parsed into the closed role set at the permission boundary
    #[schema(example = "Employee")]
    pub role: String,

    #[schema(example = "EM-1B9E0D44A2-250101", nullable = true)]
    pub manager_id: Option<String>,

    #[schema(example = "+919812345678", nullable = true)]
    pub contact: Option<String>,

    #[schema(example = "123412341234", nullable = true)]
    pub aadhaar_number: Option<String>,

    pub is_active: bool,

    #[schema(example = 50000.0, nullable = true)]
    pub salary_per_month: Option<f64>,

    #[schema(example = 200.0, nullable = true)]
    pub overtime_charge_per_hour: Option<f64>,

    #[schema(example = 150.0, nullable = true)]
    pub deduct_per_hour: Option<f64>,

    #[schema(example = 1200.0, nullable = true)]
    pub deduct_per_day: Option<f64>,
}
