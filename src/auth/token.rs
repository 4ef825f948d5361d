//! Session claims and the JWT signer that mints session tokens.
//!
//! Tokens are HS256 JWTs. The claim set is fixed: issued-at, expiry, issuer,
//! subject and the identity (claimed address) of record.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Fixed lifetime of a session.
pub const SESSION_TTL_SECS: i64 = 30 * 60;

/// Minimum accepted HMAC secret length.
pub const MIN_SECRET_LEN: usize = 32;

/// Claims carried in a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    pub iss: String,
    pub sub: String,
    /// Address of record, casing as submitted by the client
    pub identity: String,
}

impl SessionClaims {
    /// Build claims for `identity` with the fixed window starting at `now`.
    pub fn new(
        identity: impl Into<String>,
        issuer: impl Into<String>,
        subject: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let iat = now.timestamp();
        Self {
            iat,
            exp: iat + SESSION_TTL_SECS,
            iss: issuer.into(),
            sub: subject.into(),
            identity: identity.into(),
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,
}

/// Turns claims into signed, time-bound token strings and back.
pub trait TokenSigner: Send + Sync {
    /// Issuer stamped into minted claims and required when verifying.
    fn issuer(&self) -> &str;

    fn sign(&self, claims: &SessionClaims) -> Result<String, TokenError>;

    /// Check signature, issuer and expiry, returning the embedded claims.
    fn verify(&self, token: &str) -> Result<SessionClaims, TokenError>;
}

/// HS256 JWT signer.
pub struct JwtSigner {
    secret: Zeroizing<String>,
    issuer: String,
}

impl JwtSigner {
    /// Create a new signer.
    ///
    /// Returns an error if the secret is shorter than [`MIN_SECRET_LEN`].
    pub fn new(secret: impl Into<String>, issuer: impl Into<String>) -> Result<Self, TokenError> {
        let secret = Zeroizing::new(secret.into());
        if secret.len() < MIN_SECRET_LEN {
            return Err(TokenError::Signing(format!(
                "secret must be at least {} characters",
                MIN_SECRET_LEN
            )));
        }

        Ok(Self {
            secret,
            issuer: issuer.into(),
        })
    }
}

impl std::fmt::Debug for JwtSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSigner")
            .field("secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl TokenSigner for JwtSigner {
    fn issuer(&self) -> &str {
        &self.issuer
    }

    fn sign(&self, claims: &SessionClaims) -> Result<String, TokenError> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.leeway = 0;

        decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|err| {
            use jsonwebtoken::errors::ErrorKind;
            match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })
    }
}
