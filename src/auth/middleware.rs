//! Shared state and the session extractor.

use crate::auth::authenticator::Authenticator;
use crate::auth::cookie::{read_cookie, CookiePolicy, TOKEN_COOKIE};
use crate::auth::token::TokenError;
use crate::error::AppError;
use axum::{extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<Authenticator>,
    pub cookies: CookiePolicy,
}

/// Authenticated session extractor.
///
/// Reads the `IDHUB_JWT` cookie and validates it with the token signer.
/// The identity-display cookie is never consulted.
/// Returns 401 Unauthorized if the token is missing, expired or invalid.
#[derive(Debug)]
pub struct AuthSession {
    pub identity: String,
    pub expires_at: i64,
}

impl FromRequestParts<AppState> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = read_cookie(&parts.headers, TOKEN_COOKIE)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Missing session".to_string()))?;

        let claims = state.auth.signer().verify(token).map_err(|e| match e {
            TokenError::Expired => AppError::Unauthorized("Session expired".to_string()),
            _ => AppError::Unauthorized("Invalid session".to_string()),
        })?;

        Ok(AuthSession {
            identity: claims.identity,
            expires_at: claims.exp,
        })
    }
}
