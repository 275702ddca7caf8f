use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub password: String,
    pub employee_id: Option<String>,
    pub temp_password: bool,
    pub is_active: bool,
}
