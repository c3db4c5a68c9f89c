//! Store configuration.
//!
//! This module provides configuration for the key-value store connection and
//! the cache TTL, loaded from environment variables.

use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::memory::MemoryStore;
use crate::redis::{BlockingRedisStore, RedisStore};
use crate::store::{SharedBlockingStore, SharedStore, StoreError};

const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/0";
const DEFAULT_TTL_SECONDS: u64 = 60;
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 2000;

/// Scheme selecting the in-process [`MemoryStore`] instead of Redis.
pub const MEMORY_SCHEME: &str = "memory://";

/// Store configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `REDIS_URL`: store connection URL (default: `redis://127.0.0.1:6379/0`).
///   A `memory://` URL selects the in-process store.
/// - `CACHE_TTL_SECONDS`: expiry for cached entries (default: `60`, minimum `1`)
/// - `REDIS_CONNECT_TIMEOUT_MS`: connect and command timeout of both Redis
///   clients (default: `2000`)
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// Redis connection URL, or `memory://` for the in-process store
    pub redis_url: String,
    /// Expiry applied to every written entry, in seconds
    pub ttl_seconds: u64,
    /// Bound on each connection attempt and each command, in milliseconds.
    /// Bounds how long an unresponsive Redis can stall a lookup or a write.
    pub connect_timeout_ms: u64,
}

impl CacheConfig {
    pub fn from_env() -> Self {
        Self {
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.into()),
            ttl_seconds: env::var("CACHE_TTL_SECONDS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(DEFAULT_TTL_SECONDS)
                .max(1),
            connect_timeout_ms: env::var("REDIS_CONNECT_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_MS),
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn is_memory(&self) -> bool {
        self.redis_url.starts_with(MEMORY_SCHEME)
    }

    /// Builds the async store handle. Does not connect.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Redis` if `redis_url` is not a valid Redis URL.
    pub fn open_store(&self) -> Result<SharedStore, StoreError> {
        if self.is_memory() {
            return Ok(Arc::new(MemoryStore::new()));
        }
        Ok(Arc::new(RedisStore::open(
            &self.redis_url,
            self.connect_timeout(),
        )?))
    }

    /// Builds the blocking store handle. Does not connect.
    pub fn open_blocking_store(&self) -> Result<SharedBlockingStore, StoreError> {
        if self.is_memory() {
            return Ok(Arc::new(MemoryStore::new()));
        }
        Ok(Arc::new(BlockingRedisStore::open(
            &self.redis_url,
            self.connect_timeout(),
        )?))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: DEFAULT_REDIS_URL.into(),
            ttl_seconds: DEFAULT_TTL_SECONDS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
        }
    }
}

/// Startup connectivity check. Logs the outcome and never fails.
pub async fn probe_store(store: &SharedStore) -> bool {
    match store.ping().await {
        Ok(()) => {
            info!("Connected to cache store");
            true
        }
        Err(e) => {
            warn!(error = %e, "Cache store unreachable, calls will bypass the cache");
            false
        }
    }
}

/// Blocking counterpart of [`probe_store`].
pub fn probe_blocking_store(store: &SharedBlockingStore) -> bool {
    match store.ping() {
        Ok(()) => {
            info!("Connected to cache store");
            true
        }
        Err(e) => {
            warn!(error = %e, "Cache store unreachable, calls will bypass the cache");
            false
        }
    }
}
