//! Request and response models for the API.

use serde::{Deserialize, Serialize};

// ============================================================================
// Auth Models
// ============================================================================

/// Signed challenge submitted for verification.
///
/// Every field defaults to empty so a missing signature surfaces as a
/// validation failure of the verify step rather than a body rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VerifyRequest {
    /// Message the client believes it signed. Informational only.
    pub msg: String,
    /// Hex `r || s || v` signature.
    pub sig: String,
    /// Claimed address.
    pub addr: String,
}

/// Request for the booking (registration) message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BookingRequest {
    pub addr: String,
}

/// Current session, as read back from the token cookie.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub identity: String,
    /// Unix timestamp
    pub expires_at: i64,
}
