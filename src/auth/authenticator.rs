//! Challenge-response login: challenge lookup, signature recovery, identity
//! comparison and session token minting.
//!
//! The authenticator holds no mutable state. Every collaborator is injected,
//! so each request is independent and tests can swap in fakes.

use crate::auth::cookie::Session;
use crate::auth::token::{SessionClaims, TokenSigner};
use crate::auth::verify::{is_well_formed_signature, SignatureVerifier};
use crate::error::{AuthError, StoreError};
use crate::models::VerifyRequest;
use crate::storage::ChallengeStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub const DEFAULT_ISSUER: &str = "IDHub IdP";
pub const DEFAULT_SUBJECT: &str = "IDHub identity is all your life";

pub struct Authenticator {
    store: Arc<dyn ChallengeStore>,
    verifier: Arc<dyn SignatureVerifier>,
    signer: Arc<dyn TokenSigner>,
    subject: String,
}

impl Authenticator {
    pub fn new(
        store: Arc<dyn ChallengeStore>,
        verifier: Arc<dyn SignatureVerifier>,
        signer: Arc<dyn TokenSigner>,
    ) -> Self {
        Self {
            store,
            verifier,
            signer,
            subject: DEFAULT_SUBJECT.to_string(),
        }
    }

    /// Override the `sub` claim. The `iss` claim always comes from the signer,
    /// so minted tokens verify against the same issuer.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn signer(&self) -> &dyn TokenSigner {
        self.signer.as_ref()
    }

    /// Verify a signed challenge and mint a session starting now.
    pub async fn verify(&self, req: &VerifyRequest) -> Result<Session, AuthError> {
        self.verify_at(req, Utc::now()).await
    }

    /// Verify a signed challenge and mint a session issued at `now`.
    ///
    /// The session's identity is the address as the client submitted it, not
    /// the recovered one.
    pub async fn verify_at(
        &self,
        req: &VerifyRequest,
        now: DateTime<Utc>,
    ) -> Result<Session, AuthError> {
        validate(req)?;

        let challenge = self.store.verify_message(&req.addr).await?;

        if !req.msg.is_empty() && req.msg != challenge {
            tracing::debug!(addr = %req.addr, "Client message differs from stored challenge");
        }

        let recovered = self.verifier.recover(&challenge, &req.sig)?;

        if !recovered.eq_ignore_ascii_case(&req.addr) {
            return Err(AuthError::IdentityMismatch);
        }

        let claims = SessionClaims::new(
            req.addr.as_str(),
            self.signer.issuer(),
            &self.subject,
            now,
        );
        let token = self.signer.sign(&claims).map_err(|e| {
            tracing::error!(error = %e, "Session token signing failed");
            AuthError::Signing(e.to_string())
        })?;

        Ok(Session {
            token,
            expires_at: claims.expires_at(),
            identity: claims.identity,
        })
    }

    /// Registration message for `addr`, returned verbatim.
    pub async fn booking(&self, addr: &str) -> Result<String, StoreError> {
        self.store.booking_message(addr).await
    }
}

fn validate(req: &VerifyRequest) -> Result<(), AuthError> {
    if req.sig.is_empty() {
        return Err(AuthError::Validation("signature is required".to_string()));
    }
    if !is_well_formed_signature(&req.sig) {
        return Err(AuthError::Validation(
            "signature must be hex encoded".to_string(),
        ));
    }
    if req.addr.trim().is_empty() {
        return Err(AuthError::Validation("address is required".to_string()));
    }
    Ok(())
}
