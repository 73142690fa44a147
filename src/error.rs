use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Domain errors raised by the account and auth flows.
///
/// Messages are the full caller-visible contract. InvalidCredentials covers
/// both unknown-email and wrong-password; InvalidOrExpiredToken covers both
/// never-issued and expired tokens. Callers must not be able to tell the
/// collapsed cases apart.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("User already exists")]
    DuplicateEmail,
    #[error("Invalid role. Only EMPLOYEE and RESELLER_CUSTOMER are allowed")]
    RoleNotAllowed,
    #[error("Unauthorized - Admin access required")]
    AdminRequired,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Invalid or expired reset token")]
    InvalidOrExpiredToken,
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::DuplicateEmail
            | ApiError::RoleNotAllowed
            | ApiError::InvalidOrExpiredToken => StatusCode::BAD_REQUEST,
            ApiError::AdminRequired | ApiError::InvalidCredentials | ApiError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(e) = &self {
            // Full detail stays server-side.
            error!(error = ?e, "internal error");
        }
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Internal(e.into())
    }
}
