//! In-process challenge store, for tests and embedding.

use super::{address_key, ChallengeStore};
use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryChallengeStore {
    verify: RwLock<HashMap<String, String>>,
    booking: RwLock<HashMap<String, String>>,
}

impl MemoryChallengeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_verify_message(&self, address: &str, message: impl Into<String>) {
        self.verify
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(address_key(address), message.into());
    }

    pub fn put_booking_message(&self, address: &str, message: impl Into<String>) {
        self.booking
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(address_key(address), message.into());
    }
}

fn lookup(map: &RwLock<HashMap<String, String>>, address: &str) -> Result<String, StoreError> {
    map.read()
        .unwrap_or_else(|e| e.into_inner())
        .get(&address_key(address))
        .cloned()
        .ok_or_else(|| StoreError::NotFound(address.to_string()))
}

#[async_trait]
impl ChallengeStore for MemoryChallengeStore {
    async fn verify_message(&self, address: &str) -> Result<String, StoreError> {
        lookup(&self.verify, address)
    }

    async fn booking_message(&self, address: &str) -> Result<String, StoreError> {
        lookup(&self.booking, address)
    }
}
