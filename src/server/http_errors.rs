//! Service-error to HTTP-response mapping. Anything unexpected becomes an
//! opaque 500: the detail goes to the log, never to the client.

use crate::application::{AccountError, PassError, ReportError, ScheduleError};
use crate::infrastructure::RepositoryError;
use axum::http::StatusCode;
use axum::Json;
use tracing::error;

use super::http_auth::ApiError;

fn internal(fallback: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": fallback })),
    )
}

pub(super) fn map_account_error(err: &AccountError, fallback: &str) -> ApiError {
    match err {
        AccountError::Validation(msg) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": msg })),
        ),
        AccountError::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "Invalid email or password" })),
        ),
        AccountError::DuplicateEmail(_) => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "error": "Email is already registered" })),
        ),
        AccountError::AlreadyPromoted(_, role) => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "error": format!("Account already holds role {}", role) })),
        ),
        AccountError::NotFound(_)
        | AccountError::NotPromoted(_, _)
        | AccountError::Repository(RepositoryError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Account not found" })),
        ),
        _ => {
            error!(error = %err, "{}", fallback);
            internal(fallback)
        }
    }
}

pub(super) fn map_schedule_error(err: &ScheduleError, fallback: &str) -> ApiError {
    match err {
        ScheduleError::Validation(msg) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": msg })),
        ),
        ScheduleError::NotFound(_) | ScheduleError::Repository(RepositoryError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Class not found" })),
        ),
        ScheduleError::Conflict { conflict, .. } => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({
                "error": "Schedule conflict",
                "conflict": conflict,
            })),
        ),
        _ => {
            error!(error = %err, "{}", fallback);
            internal(fallback)
        }
    }
}

pub(super) fn map_pass_error(err: &PassError, fallback: &str) -> ApiError {
    match err {
        PassError::Validation(msg) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": msg })),
        ),
        PassError::NotFound(_) | PassError::Repository(RepositoryError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Pass not found" })),
        ),
        _ => {
            error!(error = %err, "{}", fallback);
            internal(fallback)
        }
    }
}

pub(super) fn map_report_error(err: &ReportError, fallback: &str) -> ApiError {
    match err {
        ReportError::Validation(msg) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": msg })),
        ),
        _ => {
            error!(error = %err, "{}", fallback);
            internal(fallback)
        }
    }
}
