use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::{Claims, TokenType};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs() as usize
}

pub fn generate_access_token(
    user_id: u64,
    username: String,
    role: String,
    employee_id: Option<String>,
    secret: &str,
    ttl: usize,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        user_id,
        sub: username,
        role,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
        token_type: TokenType::Access,
        employee_id,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn generate_refresh_token(
    user_id: u64,
    username: String,
    role: String,
    employee_id: Option<String>,
    secret: &str,
    ttl: usize,
) -> Result<(String, Claims), jsonwebtoken::errors::Error> {
    let claims = Claims {
        user_id,
        sub: username,
        role,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
        token_type: TokenType::Refresh,
        employee_id,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok((token, claims))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn access_token_round_trips() {
        let token = generate_access_token(
            7,
            "EM-1".into(),
            "Manager".into(),
            Some("EM-1".into()),
            SECRET,
            900,
        )
        .unwrap();

        let claims = verify_token(&token, SECRET).unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.role, "Manager");
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.employee_id.as_deref(), Some("EM-1"));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token =
            generate_access_token(1, "EM-1".into(), "MD".into(), None, SECRET, 900).unwrap();
        assert!(verify_token(&token, "other-secret").is_err());
    }

    #[test]
    fn refresh_token_carries_its_jti() {
        let (token, claims) =
            generate_refresh_token(1, "EM-1".into(), "PD".into(), None, SECRET, 900).unwrap();
        let decoded = verify_token(&token, SECRET).unwrap();
        assert_eq!(decoded.jti, claims.jti);
        assert_eq!(decoded.token_type, TokenType::Refresh);
    }
}
