//! Key-value store capabilities consumed by the read-through wrappers.
//!
//! The wrappers only ever need `GET`, `SETEX` and a liveness probe, so that is
//! all a backend has to provide. Suspending wrappers take a
//! [`KeyValueStore`], blocking wrappers take a [`BlockingKeyValueStore`].

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Async access to the external key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Returns the raw value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `key`, expiring after `ttl` (whole seconds).
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Round-trips a no-op command to check the store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Blocking access to the external key-value store.
pub trait BlockingKeyValueStore: Send + Sync + 'static {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    fn ping(&self) -> Result<(), StoreError>;
}

/// Process-wide handle shared by every suspending wrapper.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Process-wide handle shared by every blocking wrapper.
pub type SharedBlockingStore = Arc<dyn BlockingKeyValueStore>;

/// Whole seconds for a `SETEX`, never below one.
pub(crate) fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}
