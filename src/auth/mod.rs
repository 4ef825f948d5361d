//! Wallet challenge-response authentication and cookie-borne sessions.

pub mod authenticator;
pub mod cookie;
pub mod middleware;
pub mod token;
pub mod verify;

pub use authenticator::Authenticator;
pub use cookie::{CookiePolicy, Session};
pub use middleware::{AppState, AuthSession};
pub use token::{JwtSigner, SessionClaims, TokenSigner};
pub use verify::{EcRecover, SignatureVerifier};
