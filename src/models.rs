use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Deserialize)]
pub struct LoginReqDto {
    pub username: String,
    pub password: String,
}

/// users row joined with the linked employee, fetched at login
#[derive(FromRow)]
pub struct LoginUserSql {
    pub id: u64,
    pub username: String,
    pub password: String,
    pub employee_id: Option<String>,
    pub temp_password: bool,
    /// role name from the employees row, if linked
    pub role: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    /// role name, resolved through the closed role set on every request
    pub role: String,
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
    /// Present only if this user is linked to an employee record
    pub employee_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}
