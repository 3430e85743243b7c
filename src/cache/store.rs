//! Cache store collaborator.
//!
//! [`CacheStore`] is the contract the response cache depends on: a key/value
//! store with TTL-based expiry. [`MemoryStore`] is the in-process
//! implementation, an LRU map whose entries carry their own deadline and
//! report absent once it passes.

use std::num::NonZeroUsize;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use thiserror::Error;

use super::lock::{read_guard, write_guard};

/// An opaque cached response payload.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedPayload {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

#[derive(Debug, Error)]
pub enum CacheStoreError {
    #[error("cache store unavailable: {0}")]
    Unavailable(String),
}

/// Key/value cache store with TTL-based expiry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<CachedPayload>, CacheStoreError>;

    /// Write a complete entry, overwriting any prior value for the key. The
    /// write is all-or-nothing; there is no partial-update path.
    async fn set(
        &self,
        key: &str,
        value: CachedPayload,
        ttl: Duration,
    ) -> Result<(), CacheStoreError>;
}

struct Entry {
    value: CachedPayload,
    expires_at: Instant,
}

/// In-process cache store: LRU-bounded, per-entry TTL, expired entries
/// dropped lazily on access.
pub struct MemoryStore {
    entries: RwLock<LruCache<String, Entry>>,
}

impl MemoryStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        read_guard(&self.entries, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<CachedPayload>, CacheStoreError> {
        let mut entries = write_guard(&self.entries, "get");
        let expired = match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                return Ok(Some(entry.value.clone()));
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key);
        }
        Ok(None)
    }

    async fn set(
        &self,
        key: &str,
        value: CachedPayload,
        ttl: Duration,
    ) -> Result<(), CacheStoreError> {
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        write_guard(&self.entries, "set").put(key.to_string(), entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(body: &str) -> CachedPayload {
        CachedPayload {
            status: 200,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Bytes::copy_from_slice(body.as_bytes()),
        }
    }

    #[tokio::test]
    async fn set_then_get_roundtrip() {
        let store = MemoryStore::new(8);
        assert!(store.get("/movies").await.unwrap().is_none());

        store
            .set("/movies", payload("listing"), Duration::from_secs(60))
            .await
            .unwrap();

        let cached = store.get("/movies").await.unwrap().expect("cached");
        assert_eq!(cached.body, Bytes::from("listing"));
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let store = MemoryStore::new(8);
        store
            .set("/movies", payload("stale"), Duration::from_millis(10))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(25)).await;

        assert!(store.get("/movies").await.unwrap().is_none());
        // The expired entry was dropped, not just hidden.
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn overwrite_replaces_entry_wholesale() {
        let store = MemoryStore::new(8);
        store
            .set("/movies", payload("first"), Duration::from_secs(60))
            .await
            .unwrap();
        store
            .set("/movies", payload("second"), Duration::from_secs(60))
            .await
            .unwrap();

        let cached = store.get("/movies").await.unwrap().expect("cached");
        assert_eq!(cached.body, Bytes::from("second"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn capacity_evicts_least_recently_used() {
        let store = MemoryStore::new(2);
        store
            .set("/a", payload("a"), Duration::from_secs(60))
            .await
            .unwrap();
        store
            .set("/b", payload("b"), Duration::from_secs(60))
            .await
            .unwrap();
        store
            .set("/c", payload("c"), Duration::from_secs(60))
            .await
            .unwrap();

        assert!(store.get("/a").await.unwrap().is_none());
        assert!(store.get("/b").await.unwrap().is_some());
        assert!(store.get("/c").await.unwrap().is_some());
    }
}
