//! In-process store with per-entry expiry.
//!
//! Selected with a `memory://` URL, and used as the store double in tests.
//! Implements both the async and the blocking store traits over the same map.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::store::{BlockingKeyValueStore, KeyValueStore, StoreError, ttl_secs};

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// Shared in-memory key-value store. Clones see the same entries.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>, StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }

    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut entries = self.lock()?;
        let now = Instant::now();

        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn write(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let now = Instant::now();
        let expires_at = now + Duration::from_secs(ttl_secs(ttl));
        let mut entries = self.lock()?;

        // Purge expired entries, including keys that are never read again.
        entries.retain(|_, e| e.expires_at > now);
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.lock()
            .map(|entries| entries.values().filter(|e| e.expires_at > now).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    fn stored(&self) -> usize {
        self.lock().map(|entries| entries.len()).unwrap_or(0)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.read(key)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        self.write(key, value, ttl)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

impl BlockingKeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.read(key)
    }

    fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        self.write(key, value, ttl)
    }

    fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let store = MemoryStore::new();
        BlockingKeyValueStore::set_ex(&store, "k", "v", Duration::from_secs(60)).unwrap();

        assert_eq!(
            BlockingKeyValueStore::get(&store, "k").unwrap().as_deref(),
            Some("v")
        );
        assert_eq!(BlockingKeyValueStore::get(&store, "other").unwrap(), None);
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let store = MemoryStore::new();
        BlockingKeyValueStore::set_ex(&store, "k", "v", Duration::from_secs(1)).unwrap();
        assert_eq!(store.len(), 1);

        std::thread::sleep(Duration::from_millis(1100));

        assert_eq!(BlockingKeyValueStore::get(&store, "k").unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_write_drops_expired_entries() {
        let store = MemoryStore::new();
        for i in 0..100 {
            let key = format!("fetch:{i}.0:0.0");
            BlockingKeyValueStore::set_ex(&store, &key, "v", Duration::from_secs(1)).unwrap();
        }
        assert_eq!(store.stored(), 100);

        std::thread::sleep(Duration::from_millis(1100));
        BlockingKeyValueStore::set_ex(&store, "fresh", "v", Duration::from_secs(60)).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.stored(), 1);
    }

    #[test]
    fn test_sub_second_ttl_rounds_up() {
        let store = MemoryStore::new();
        BlockingKeyValueStore::set_ex(&store, "k", "v", Duration::from_millis(10)).unwrap();

        std::thread::sleep(Duration::from_millis(50));
        assert!(BlockingKeyValueStore::get(&store, "k").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let store = MemoryStore::new();
        let other = store.clone();

        KeyValueStore::set_ex(&store, "k", "v", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(
            KeyValueStore::get(&other, "k").await.unwrap().as_deref(),
            Some("v")
        );
    }
}
