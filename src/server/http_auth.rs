use crate::domain::Capability;
use crate::infrastructure::{auth, AuthError, Claims};
use axum::http::{header, header::HeaderMap, StatusCode};
use axum::Json;

pub(super) type ApiError = (StatusCode, Json<serde_json::Value>);

pub(super) fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
}

/// Authenticate the request. Every protected handler calls this first, then
/// [`require`] with the one capability the route needs.
pub(super) fn authenticate(headers: &HeaderMap, secret: &str) -> Result<Claims, ApiError> {
    let token = extract_bearer_token(headers).ok_or((
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": "Authentication required" })),
    ))?;

    auth::verify_token(token, secret).map_err(|e| {
        let message = match e {
            AuthError::TokenExpired => "Token expired",
            _ => "Invalid token",
        };
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": message })),
        )
    })
}

pub(super) fn require(claims: &Claims, capability: Capability) -> Result<(), ApiError> {
    if claims.role.allows(capability) {
        Ok(())
    } else {
        Err((
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({ "error": "Insufficient permissions" })),
        ))
    }
}

/// Self-or-manager access: accounts may act on their own resources, managers
/// on anyone's.
pub(super) fn require_self_or(
    claims: &Claims,
    account_id: &str,
    capability: Capability,
) -> Result<(), ApiError> {
    if claims.sub == account_id {
        return Ok(());
    }
    require(claims, capability)
}
