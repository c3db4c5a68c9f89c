//! # Skycache Cache
//!
//! Read-through caching for location-keyed data fetches.
//!
//! This crate provides:
//! - Cache key derivation from rounded coordinates ([`keys`])
//! - Store capabilities and backends: Redis and in-process ([`store`], [`redis`], [`memory`])
//! - A `tower` layer for async operations ([`ReadThroughLayer`])
//! - A wrapper for blocking functions ([`BlockingReadThrough`])
//! - Store configuration from environment variables ([`CacheConfig`])
//!
//! # Example
//!
//! ```ignore
//! use skycache_cache::{CacheConfig, ReadThroughLayer, probe_store};
//!
//! let config = CacheConfig::from_env();
//! let store = config.open_store()?;
//! probe_store(&store).await;
//!
//! let moon = ReadThroughLayer::new("moon_details", store.clone())
//!     .with_ttl(config.ttl())
//!     .layer(service_fn(fetch_moon));
//! ```

pub mod blocking;
pub mod config;
pub mod keys;
pub mod memory;
pub mod read_through;
pub mod redis;
pub mod store;

pub use blocking::BlockingReadThrough;
pub use config::{CacheConfig, probe_blocking_store, probe_store};
pub use keys::{DEFAULT_LATITUDE, DEFAULT_LONGITUDE, Located, cache_key};
pub use memory::MemoryStore;
pub use read_through::{DEFAULT_TTL, ReadThrough, ReadThroughLayer};
pub use redis::{BlockingRedisStore, RedisStore};
pub use store::{BlockingKeyValueStore, KeyValueStore, SharedBlockingStore, SharedStore, StoreError};
