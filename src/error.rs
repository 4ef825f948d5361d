//! Error types and Axum response conversions.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// HTTP-facing error types.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not acceptable: {0}")]
    NotAcceptable(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::NotAcceptable(msg) => (StatusCode::NOT_ACCEPTABLE, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Challenge store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("No pending message for address {0}")]
    NotFound(String),

    #[error("Challenge store timed out")]
    Timeout,

    /// Backend detail stays in logs; the display text is what callers see.
    #[error("Challenge store unavailable")]
    Backend(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Backend(format!("Redis error: {}", err))
    }
}

/// Failures of the verify step.
///
/// Every variant ends the same way at the HTTP boundary: both session
/// cookies are cleared and the caller gets a 401 carrying the display text.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error(transparent)]
    ChallengeLookup(#[from] StoreError),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("verify failed")]
    IdentityMismatch,

    /// Carries the signer's detail for logging only.
    #[error("Failed to issue session token")]
    Signing(String),
}

impl AuthError {
    /// Short machine-friendly label used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::Validation(_) => "validation",
            AuthError::ChallengeLookup(_) => "challenge_lookup",
            AuthError::InvalidSignature(_) => "invalid_signature",
            AuthError::IdentityMismatch => "identity_mismatch",
            AuthError::Signing(_) => "signing",
        }
    }
}
