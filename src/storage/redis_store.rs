//! Redis-backed challenge store.
//!
//! Redis key patterns:
//! - `verify:{address}`: pending login challenge (STRING)
//! - `booking:{address}`: registration message (STRING)
//!
//! Addresses are lower-cased for the key. Whoever issues challenges writes
//! these keys with a TTL; expiry and single use are enforced there, not here.

use super::{address_key, ChallengeStore};
use crate::error::StoreError;
use async_trait::async_trait;
use redis::AsyncCommands;
use std::future::Future;
use std::time::Duration;

const VERIFY_PREFIX: &str = "verify";
const BOOKING_PREFIX: &str = "booking";

#[derive(Debug, Clone)]
pub struct RedisChallengeStore {
    client: redis::Client,
    timeout: Duration,
}

impl RedisChallengeStore {
    /// Every store call (connect + command) is bounded by `timeout`.
    pub fn new(client: redis::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Write a login challenge for `address` that expires after `ttl_secs`.
    pub async fn put_verify_message(
        &self,
        address: &str,
        message: &str,
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        self.set(&verify_key(address), message, ttl_secs).await
    }

    /// Write a booking message for `address` that expires after `ttl_secs`.
    pub async fn put_booking_message(
        &self,
        address: &str,
        message: &str,
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        self.set(&booking_key(address), message, ttl_secs).await
    }

    async fn set(&self, key: &str, message: &str, ttl_secs: u64) -> Result<(), StoreError> {
        self.bounded(async {
            let mut con = self.client.get_multiplexed_async_connection().await?;
            con.set_ex::<_, _, ()>(key, message, ttl_secs).await?;
            Ok::<_, StoreError>(())
        })
        .await
    }

    async fn get(&self, key: &str, address: &str) -> Result<String, StoreError> {
        let value: Option<String> = self
            .bounded(async {
                let mut con = self.client.get_multiplexed_async_connection().await?;
                let value: Option<String> = con.get(key).await?;
                Ok::<_, StoreError>(value)
            })
            .await?;

        value.ok_or_else(|| StoreError::NotFound(address.to_string()))
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.inspect_err(|e| {
                if let StoreError::Backend(detail) = e {
                    tracing::error!(error = %detail, "Challenge store request failed");
                }
            }),
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Challenge store timed out"
                );
                Err(StoreError::Timeout)
            }
        }
    }
}

#[async_trait]
impl ChallengeStore for RedisChallengeStore {
    async fn verify_message(&self, address: &str) -> Result<String, StoreError> {
        self.get(&verify_key(address), address).await
    }

    async fn booking_message(&self, address: &str) -> Result<String, StoreError> {
        self.get(&booking_key(address), address).await
    }
}

fn verify_key(address: &str) -> String {
    format!("{}:{}", VERIFY_PREFIX, address_key(address))
}

fn booking_key(address: &str) -> String {
    format!("{}:{}", BOOKING_PREFIX, address_key(address))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(verify_key("0xAbC"), "verify:0xabc");
        assert_eq!(booking_key("0xAbC"), "booking:0xabc");
    }

    #[tokio::test]
    async fn test_round_trip_against_redis() {
        // Note: This test requires a running Redis instance
        // Skip if REDIS_URL is not set
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        let client = match redis::Client::open(redis_url) {
            Ok(c) => c,
            Err(_) => {
                eprintln!("Skipping test: Redis not available");
                return;
            }
        };
        if client.get_multiplexed_async_connection().await.is_err() {
            eprintln!("Skipping test: Redis connection failed");
            return;
        }

        let store = RedisChallengeStore::new(client, Duration::from_secs(2));
        let address = "0xTestStoreRoundTrip";

        store
            .put_verify_message(address, "login challenge", 30)
            .await
            .unwrap();
        store
            .put_booking_message(address, "booking message", 30)
            .await
            .unwrap();

        assert_eq!(
            store.verify_message("0xteststoreroundtrip").await.unwrap(),
            "login challenge"
        );
        assert_eq!(
            store.booking_message(address).await.unwrap(),
            "booking message"
        );
        assert_eq!(
            store.verify_message("0xnobody").await,
            Err(StoreError::NotFound("0xnobody".to_string()))
        );
    }

    #[tokio::test]
    async fn test_unreachable_redis_is_store_failure() {
        // Port 1 is never a Redis server; connect fails or times out
        let client = redis::Client::open("redis://127.0.0.1:1").unwrap();
        let store = RedisChallengeStore::new(client, Duration::from_millis(500));

        let result = store.verify_message("0xabc").await;
        assert!(matches!(
            result,
            Err(StoreError::Backend(_)) | Err(StoreError::Timeout)
        ));
    }
}
