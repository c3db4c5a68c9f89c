//! Read-through caching for suspending operations.
//!
//! [`ReadThroughLayer`] wraps any [`tower::Service`] whose requests are
//! [`Located`] and whose responses round-trip through JSON. Each call:
//!
//! 1. derives `<name>:<lat>:<lon>` from the request,
//! 2. returns the stored value on a hit without calling the inner service,
//! 3. otherwise calls the inner service and stores its response with `SETEX`.
//!
//! Store failures are logged and otherwise ignored, so the wrapped service
//! keeps answering while the store is down. Errors from the inner service are
//! returned untouched and nothing is written for them.
//!
//! # Example
//!
//! ```ignore
//! use skycache_cache::{MemoryStore, ReadThroughLayer};
//! use tower::{Layer, ServiceExt, service_fn};
//!
//! let layer = ReadThroughLayer::new("fetch", Arc::new(MemoryStore::new()))
//!     .with_ttl(Duration::from_secs(60));
//! let fetch = layer.layer(service_fn(|q: SkyQuery| async move { Ok::<_, Infallible>(json!({"temp": 20})) }));
//!
//! let value = fetch.oneshot(SkyQuery::at(35.92, -86.86)).await?;
//! ```

use futures::future::BoxFuture;
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tower::{Layer, Service};
use tracing::{debug, warn};

use crate::keys::{Located, cache_key};
use crate::store::SharedStore;

/// TTL applied when none is configured.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Clamps a TTL to whole seconds, at least one.
pub(crate) fn normalize_ttl(ttl: Duration) -> Duration {
    Duration::from_secs(ttl.as_secs().max(1))
}

/// Parses a stored entry. Undecodable entries count as misses.
pub(crate) fn decode_entry<T: DeserializeOwned>(key: &str, raw: &str) -> Option<T> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(cache.key = %key, error = %e, "Failed to deserialize cached value, treating as miss");
            None
        }
    }
}

/// Serializes a fresh result for storage. Unencodable results are not cached.
pub(crate) fn encode_entry<T: Serialize>(key: &str, value: &T) -> Option<String> {
    match serde_json::to_string(value) {
        Ok(json) => Some(json),
        Err(e) => {
            warn!(cache.key = %key, error = %e, "Failed to serialize result, skipping cache write");
            None
        }
    }
}

/// [`Layer`] that adds read-through caching to a service.
#[derive(Clone)]
pub struct ReadThroughLayer {
    name: Arc<str>,
    store: SharedStore,
    ttl: Duration,
}

impl std::fmt::Debug for ReadThroughLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadThroughLayer")
            .field("name", &self.name)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl ReadThroughLayer {
    /// Creates a layer caching under `name` with the default 60 second TTL.
    ///
    /// `name` is the operation identity that prefixes every key, so two
    /// wrapped operations must not share it.
    pub fn new(name: impl Into<Arc<str>>, store: SharedStore) -> Self {
        Self {
            name: name.into(),
            store,
            ttl: DEFAULT_TTL,
        }
    }

    /// Sets the expiry for entries written by this layer.
    ///
    /// Redis expiries are whole seconds, so the TTL is truncated to seconds
    /// and never drops below one.
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
}

impl<S> Layer<S> for ReadThroughLayer {
    type Service = ReadThrough<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ReadThrough {
            inner,
            name: self.name.clone(),
            store: self.store.clone(),
            ttl: self.ttl,
        }
    }
}

/// Service produced by [`ReadThroughLayer`].
#[derive(Clone)]
pub struct ReadThrough<S> {
    inner: S,
    name: Arc<str>,
    store: SharedStore,
    ttl: Duration,
}

impl<S, Req> Service<Req> for ReadThrough<S>
where
    S: Service<Req> + Clone + Send + 'static,
    S::Future: Send,
    S::Response: Serialize + DeserializeOwned + Send + 'static,
    S::Error: Send + 'static,
    Req: Located + Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<S::Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        // The clone is not ready; keep it and drive the one poll_ready prepared.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let key = cache_key(&self.name, &req);
        let store = self.store.clone();
        let ttl = self.ttl;

        Box::pin(async move {
            match store.get(&key).await {
                Ok(Some(raw)) => {
                    if let Some(value) = decode_entry(&key, &raw) {
                        debug!(cache.key = %key, "Cache hit");
                        return Ok(value);
                    }
                }
                Ok(None) => debug!(cache.key = %key, "Cache miss"),
                Err(e) => warn!(cache.key = %key, error = %e, "Cache lookup failed"),
            }

            let result = inner.call(req).await?;

            if let Some(json) = encode_entry(&key, &result) {
                match store.set_ex(&key, &json, ttl).await {
                    Ok(()) => {
                        debug!(cache.key = %key, cache.ttl_secs = %ttl.as_secs(), "Cache set")
                    }
                    Err(e) => warn!(cache.key = %key, error = %e, "Cache write failed"),
                }
            }

            Ok(result)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use crate::store::{KeyValueStore, StoreError};
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::{ServiceExt, service_fn};

    struct DownStore;

    #[async_trait]
    impl KeyValueStore for DownStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn set_ex(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    #[test]
    fn test_ttl_defaults_and_clamps() {
        let layer = ReadThroughLayer::new("fetch", Arc::new(MemoryStore::new()));
        assert_eq!(layer.ttl(), Duration::from_secs(60));

        let layer = layer.with_ttl(Duration::from_millis(300));
        assert_eq!(layer.ttl(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_second_call_is_served_from_store() {
        let store = MemoryStore::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        let fetch = ReadThroughLayer::new("fetch", Arc::new(store.clone())).layer(service_fn(
            move |_: (f64, f64)| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, Infallible>(json!({"temp": 20}))
                }
            },
        ));

        let first = fetch.clone().oneshot((35.92, -86.86)).await.unwrap();
        let second = fetch.clone().oneshot((35.94, -86.88)).await.unwrap();

        assert_eq!(first, json!({"temp": 20}));
        assert_eq!(second, first);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let stored = KeyValueStore::get(&store, "fetch:35.9:-86.9").await.unwrap();
        assert_eq!(stored.as_deref(), Some(r#"{"temp":20}"#));
    }

    #[tokio::test]
    async fn test_store_down_still_returns_result() {
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        let fetch = ReadThroughLayer::new("fetch", Arc::new(DownStore)).layer(service_fn(
            move |(lat, _): (f64, f64)| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, Infallible>(lat * 2.0)
                }
            },
        ));

        assert_eq!(fetch.clone().oneshot((1.5, 0.0)).await.unwrap(), 3.0);
        assert_eq!(fetch.clone().oneshot((1.5, 0.0)).await.unwrap(), 3.0);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_inner_error_propagates_without_write() {
        let store = MemoryStore::new();
        let fetch = ReadThroughLayer::new("fetch", Arc::new(store.clone())).layer(service_fn(
            |_: (f64, f64)| async { Err::<Value, _>("bad input".to_string()) },
        ));

        let err = fetch.oneshot((35.92, -86.86)).await.unwrap_err();

        assert_eq!(err, "bad input");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss() {
        let store = MemoryStore::new();
        KeyValueStore::set_ex(&store, "fetch:35.9:-86.9", "{not json", Duration::from_secs(60))
            .await
            .unwrap();

        let fetch = ReadThroughLayer::new("fetch", Arc::new(store.clone())).layer(service_fn(
            |_: (f64, f64)| async { Ok::<_, Infallible>(json!({"temp": 21})) },
        ));

        let value = fetch.oneshot((35.92, -86.86)).await.unwrap();
        assert_eq!(value, json!({"temp": 21}));

        let stored = KeyValueStore::get(&store, "fetch:35.9:-86.9").await.unwrap();
        assert_eq!(stored.as_deref(), Some(r#"{"temp":21}"#));
    }
}
