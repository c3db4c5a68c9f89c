//! Redis-backed stores.
//!
//! [`RedisStore`] serves suspending wrappers over a multiplexed
//! [`ConnectionManager`]; [`BlockingRedisStore`] serves blocking wrappers over a
//! single synchronous connection. Both connect lazily, so a Redis that is down
//! when the process starts only costs cache hits until it comes back.

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Client, Commands, Connection};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

use crate::store::{BlockingKeyValueStore, KeyValueStore, StoreError, ttl_secs};

/// Async Redis client shared by all suspending wrappers.
///
/// Each call makes at most one connection attempt. Connecting and every
/// command are bounded by the timeout given to [`RedisStore::open`].
pub struct RedisStore {
    client: Client,
    timeout: Duration,
    conn: OnceCell<ConnectionManager>,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("timeout", &self.timeout)
            .field("connected", &self.conn.initialized())
            .finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Creates a store for `redis_url` without connecting.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Redis` if the URL cannot be parsed.
    pub fn open(redis_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        Ok(Self {
            client: Client::open(redis_url)?,
            timeout,
            conn: OnceCell::new(),
        })
    }

    fn manager_config(&self) -> ConnectionManagerConfig {
        ConnectionManagerConfig::new()
            .set_number_of_retries(0)
            .set_connection_timeout(self.timeout)
            .set_response_timeout(self.timeout)
    }

    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                debug!("Opening Redis connection manager");
                ConnectionManager::new_with_config(self.client.clone(), self.manager_config()).await
            })
            .await?;

        Ok(conn.clone())
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    #[instrument(skip(self), fields(cache.operation = "GET"))]
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    #[instrument(skip(self, value), fields(cache.operation = "SETEX"))]
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(key, value, ttl_secs(ttl)).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(cache.operation = "PING"))]
    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

/// Blocking Redis client holding one connection.
///
/// The connection is opened on first use and discarded after any I/O error,
/// so the next call reconnects.
pub struct BlockingRedisStore {
    client: Client,
    connect_timeout: Duration,
    conn: Mutex<Option<Connection>>,
}

impl std::fmt::Debug for BlockingRedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingRedisStore")
            .field("connect_timeout", &self.connect_timeout)
            .finish_non_exhaustive()
    }
}

impl BlockingRedisStore {
    /// Creates a store for `redis_url` without connecting.
    pub fn open(redis_url: &str, connect_timeout: Duration) -> Result<Self, StoreError> {
        Ok(Self {
            client: Client::open(redis_url)?,
            connect_timeout,
            conn: Mutex::new(None),
        })
    }

    fn with_connection<T>(
        &self,
        op: impl FnOnce(&mut Connection) -> redis::RedisResult<T>,
    ) -> Result<T, StoreError> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".into()))?;

        if guard.is_none() {
            debug!("Opening blocking Redis connection");
            let conn = self.client.get_connection_with_timeout(self.connect_timeout)?;
            conn.set_read_timeout(Some(self.connect_timeout))?;
            conn.set_write_timeout(Some(self.connect_timeout))?;
            *guard = Some(conn);
        }

        let Some(conn) = guard.as_mut() else {
            return Err(StoreError::Unavailable("no connection".into()));
        };

        op(conn).map_err(|e| {
            if e.is_io_error() || e.is_connection_dropped() {
                *guard = None;
            }
            StoreError::from(e)
        })
    }
}

impl BlockingKeyValueStore for BlockingRedisStore {
    #[instrument(skip(self), fields(cache.operation = "GET"))]
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.with_connection(|conn| conn.get(key))
    }

    #[instrument(skip(self, value), fields(cache.operation = "SETEX"))]
    fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        self.with_connection(|conn| conn.set_ex::<_, _, ()>(key, value, ttl_secs(ttl)))
    }

    #[instrument(skip(self), fields(cache.operation = "PING"))]
    fn ping(&self) -> Result<(), StoreError> {
        self.with_connection(|conn| redis::cmd("PING").query::<String>(conn))
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_open_rejects_bad_url() {
        assert!(RedisStore::open("not a url", Duration::from_secs(1)).is_err());
        assert!(BlockingRedisStore::open("not a url", Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_an_error_not_a_panic() {
        let store =
            RedisStore::open("redis://127.0.0.1:1/0", Duration::from_millis(200)).unwrap();
        assert!(store.ping().await.is_err());
        assert!(store.get("skycache:test").await.is_err());
    }

    #[tokio::test]
    async fn test_failed_connect_is_attempted_once_per_call() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));

        let counter = accepted.clone();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                drop(socket);
            }
        });

        let store =
            RedisStore::open(&format!("redis://{addr}/0"), Duration::from_millis(500)).unwrap();

        assert!(store.get("skycache:test").await.is_err());
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(accepted.load(Ordering::SeqCst), 1);

        assert!(
            store
                .set_ex("skycache:test", "1", Duration::from_secs(5))
                .await
                .is_err()
        );
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(accepted.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_blocking_unreachable_server_is_an_error() {
        let store =
            BlockingRedisStore::open("redis://127.0.0.1:1/0", Duration::from_millis(200)).unwrap();
        assert!(store.ping().is_err());
        assert!(store.set_ex("skycache:test", "1", Duration::from_secs(5)).is_err());
    }

    // Tests below need a running Redis instance.

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_set_and_get() {
        let store = RedisStore::open("redis://localhost:6379", Duration::from_secs(1)).unwrap();

        store
            .set_ex("skycache:test:key", r#"{"temp":20}"#, Duration::from_secs(60))
            .await
            .unwrap();

        let value = store.get("skycache:test:key").await.unwrap();
        assert_eq!(value.as_deref(), Some(r#"{"temp":20}"#));
    }

    #[test]
    #[ignore = "requires Redis"]
    fn test_blocking_entry_expires() {
        let store =
            BlockingRedisStore::open("redis://localhost:6379", Duration::from_secs(1)).unwrap();

        store
            .set_ex("skycache:test:expiring", "1", Duration::from_secs(1))
            .unwrap();
        assert!(store.get("skycache:test:expiring").unwrap().is_some());

        std::thread::sleep(Duration::from_millis(2100));
        assert!(store.get("skycache:test:expiring").unwrap().is_none());
    }
}
