//! Challenge store: pending verify and booking messages keyed by address.
//!
//! The store owns challenge lifecycle (creation, expiry, single use). The
//! authenticator only reads from it.

pub mod memory;
pub mod redis_store;

use crate::error::StoreError;
use async_trait::async_trait;

pub use self::memory::MemoryChallengeStore;
pub use self::redis_store::RedisChallengeStore;

/// Key-value lookup of the messages an address is expected to sign.
#[async_trait]
pub trait ChallengeStore: Send + Sync {
    /// Pending challenge an address must sign to log in.
    async fn verify_message(&self, address: &str) -> Result<String, StoreError>;

    /// Registration message handed out by the booking step.
    async fn booking_message(&self, address: &str) -> Result<String, StoreError>;
}

/// Storage key component for an address. Hex case carries no meaning.
pub fn address_key(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_key_normalizes_case() {
        assert_eq!(address_key("0xAbCdEF"), "0xabcdef");
        assert_eq!(address_key(" 0xabc "), "0xabc");
    }
}
