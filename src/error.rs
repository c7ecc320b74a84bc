//! Application error type mapped onto HTTP responses.
//!
//! Each variant carries its status code explicitly; handlers return
//! `Result<_, ApiError>` and the conversion happens in one place.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or missing input; never reaches storage.
    #[error("{0}")]
    Validation(String),

    /// Login with an unknown email or wrong password.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Session cookie missing, unknown or expired.
    #[error("Not authenticated")]
    Unauthenticated,

    /// A valid session points at an account that no longer exists.
    #[error("Account not found")]
    AccountNotFound,

    /// Authenticated, but the operation requires the admin role.
    #[error("Admin access required")]
    ForbiddenRole,

    #[error("{0}")]
    NotFound(String),

    #[error("Too many attempts. Please try again later.")]
    RateLimited,

    /// Storage or runtime failure; details are logged, never returned.
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials
            | ApiError::Unauthenticated
            | ApiError::AccountNotFound => StatusCode::UNAUTHORIZED,
            ApiError::ForbiddenRole => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Storage/runtime details are logged server-side only.
        let message = match &self {
            ApiError::Internal(e) => {
                tracing::error!("internal error: {e:#}");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
