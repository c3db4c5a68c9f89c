//! Read-through caching for blocking operations.
//!
//! Same contract as [`ReadThroughLayer`](crate::ReadThroughLayer), for plain
//! functions called from synchronous code. The store is reached through a
//! [`BlockingKeyValueStore`](crate::BlockingKeyValueStore), so no runtime is
//! needed.

use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::keys::{Located, cache_key};
use crate::read_through::{DEFAULT_TTL, decode_entry, encode_entry, normalize_ttl};
use crate::store::SharedBlockingStore;

/// A blocking function wrapped with read-through caching.
pub struct BlockingReadThrough<F> {
    func: F,
    name: Arc<str>,
    store: SharedBlockingStore,
    ttl: Duration,
}

impl<F> std::fmt::Debug for BlockingReadThrough<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingReadThrough")
            .field("name", &self.name)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl<F> BlockingReadThrough<F> {
    /// Wraps `func`, caching under `name` with the default 60 second TTL.
    pub fn new(name: impl Into<Arc<str>>, store: SharedBlockingStore, func: F) -> Self {
        Self {
            func,
            name: name.into(),
            store,
            ttl: DEFAULT_TTL,
        }
    }

    /// Sets the expiry for written entries (whole seconds, at least one).
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = normalize_ttl(ttl);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Calls the wrapped function, consulting the store first.
    pub fn call<Req, T, E>(&self, req: Req) -> Result<T, E>
    where
        F: Fn(Req) -> Result<T, E>,
        Req: Located,
        T: Serialize + DeserializeOwned,
    {
        let key = cache_key(&self.name, &req);

        match self.store.get(&key) {
            Ok(Some(raw)) => {
                if let Some(value) = decode_entry(&key, &raw) {
                    debug!(cache.key = %key, "Cache hit");
                    return Ok(value);
                }
            }
            Ok(None) => debug!(cache.key = %key, "Cache miss"),
            Err(e) => warn!(cache.key = %key, error = %e, "Cache lookup failed"),
        }

        let result = (self.func)(req)?;

        if let Some(json) = encode_entry(&key, &result) {
            match self.store.set_ex(&key, &json, self.ttl) {
                Ok(()) => {
                    debug!(cache.key = %key, cache.ttl_secs = %self.ttl.as_secs(), "Cache set")
                }
                Err(e) => warn!(cache.key = %key, error = %e, "Cache write failed"),
            }
        }

        Ok(result)
    }
}
