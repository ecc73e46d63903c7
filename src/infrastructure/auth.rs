//! Password hashing (Argon2id, PHC strings) and bearer-token issue/verify
//! (HS256 JWT).

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString};
use argon2::{Argon2, PasswordVerifier};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{Account, Role};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hashing(e.to_string()))?;
    Ok(hash.to_string())
}

/// Constant-shape verification: a malformed stored hash reads as a mismatch,
/// never as a distinguishable error.
pub fn verify_password(password: &str, phc_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(phc_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Bearer-token claims. `sub` is the account ID; `role` is carried so
/// handlers can authorize without a database round trip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

pub fn issue_token(account: &Account, secret: &str, ttl_minutes: i64) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = Claims {
        sub: account.account_id.clone(),
        email: account.email.clone(),
        role: account.role,
        iat: now.timestamp(),
        exp: (now + Duration::minutes(ttl_minutes)).timestamp(),
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ContactMethod;

    fn account(role: Role) -> Account {
        Account::new(
            "U00001".into(),
            "Ada".into(),
            "Lovelace".into(),
            "ada@example.com".into(),
            "555-0100".into(),
            "1 Analytical Way".into(),
            ContactMethod::Email,
            role,
        )
    }

    #[test]
    fn hash_then_verify_round_trips() {
        let hash = hash_password("hunter42").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter42", &hash));
        assert!(!verify_password("hunter43", &hash));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("hunter42").unwrap();
        let b = hash_password("hunter42").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_stored_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn issued_token_carries_identity_claims() {
        let token = issue_token(&account(Role::Manager), "test-secret", 60).unwrap();
        let claims = verify_token(&token, "test-secret").unwrap();
        assert_eq!(claims.sub, "U00001");
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.role, Role::Manager);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(&account(Role::Client), "test-secret", 60).unwrap();
        assert!(matches!(
            verify_token(&token, "other-secret"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn expired_token_is_rejected_as_expired() {
        let token = issue_token(&account(Role::Client), "test-secret", -120).unwrap();
        assert!(matches!(
            verify_token(&token, "test-secret"),
            Err(AuthError::TokenExpired)
        ));
    }
}
