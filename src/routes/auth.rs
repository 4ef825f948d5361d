//! Auth API endpoints.

use crate::auth::cookie::{CookiePolicy, Session};
use crate::auth::middleware::{AppState, AuthSession};
use crate::error::{AppError, AuthError};
use crate::extract::{Bind, BindError};
use crate::models::{BookingRequest, SessionResponse, VerifyRequest};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

/// POST /api/auth/booking: Fetch the registration message for an address
///
/// Accepts a JSON or form body. Read-only: failures answer 406 and never
/// touch session cookies. An unreadable body is looked up as an empty address.
pub async fn booking(
    State(state): State<AppState>,
    body: Result<Bind<BookingRequest>, BindError>,
) -> Result<impl IntoResponse, AppError> {
    let req = match body {
        Ok(Bind(req)) => req,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable booking body");
            BookingRequest::default()
        }
    };

    let message = state.auth.booking(&req.addr).await.map_err(|e| {
        tracing::info!(
            action = "booking_failed",
            addr = %req.addr,
            error = %e,
            "Booking lookup failed"
        );
        AppError::NotAcceptable(e.to_string())
    })?;

    Ok((StatusCode::OK, message))
}

/// POST /api/auth/verify: Verify a signed challenge and open a session
///
/// Accepts a JSON or form body. Succeeds with both session cookies set, or
/// fails with both cleared.
pub async fn verify(
    State(state): State<AppState>,
    body: Result<Bind<VerifyRequest>, BindError>,
) -> Response {
    let result = match body {
        Ok(Bind(req)) => state.auth.verify(&req).await.inspect(|session| {
            tracing::info!(
                action = "auth_success",
                identity = %session.identity,
                "Identity verified"
            );
        }),
        Err(rejection) => Err(AuthError::Validation(rejection.body_text())),
    };

    session_response(&state.cookies, result)
}

/// POST /api/auth/logout: Clear the session cookies
///
/// Idempotent; succeeds whether or not a session exists.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    state.cookies.apply_teardown(&mut headers);

    tracing::info!(action = "logout", "Session cookies cleared");

    (StatusCode::OK, headers)
}

/// GET /api/auth/session: Identity behind the current session token
pub async fn current_session(session: AuthSession) -> Json<SessionResponse> {
    Json(SessionResponse {
        identity: session.identity,
        expires_at: session.expires_at,
    })
}

/// Map a verify outcome onto the wire.
///
/// Success sets both cookies. Every failure clears both and answers 401 with
/// the error's message, whichever check failed. A session whose cookies
/// cannot be rendered is a failure too.
fn session_response(cookies: &CookiePolicy, result: Result<Session, AuthError>) -> Response {
    let mut headers = HeaderMap::new();

    let result = result.and_then(|session| {
        cookies
            .apply_establish(&mut headers, &session)
            .map_err(|e| AuthError::Signing(e.to_string()))
    });

    match result {
        Ok(()) => (StatusCode::OK, headers).into_response(),
        Err(err) => {
            tracing::warn!(
                action = "auth_failed",
                reason = err.kind(),
                error = %err,
                "Verification failed"
            );
            cookies.apply_teardown(&mut headers);
            (headers, AppError::Unauthorized(err.to_string())).into_response()
        }
    }
}
