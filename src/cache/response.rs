//! Read-through response cache.

use std::sync::Arc;

use metrics::counter;
use tracing::warn;

use super::keys::canonical_key;
use super::policy::TtlPolicy;
use super::store::{CacheStore, CachedPayload};

const SOURCE: &str = "cache::response";

/// Read-through cache over an external key/value store.
///
/// Both operations are fail-open: a store outage is logged and reported as a
/// miss (`lookup`) or swallowed (`store`); it must never fail the request
/// being served.
#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    policy: TtlPolicy,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn CacheStore>, policy: TtlPolicy) -> Self {
        Self { store, policy }
    }

    /// Look up the cached payload for a concrete request path and its query
    /// parameters.
    pub async fn lookup(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Option<CachedPayload> {
        let key = canonical_key(path, params);
        match self.store.get(&key).await {
            Ok(Some(payload)) => {
                counter!("marquee_response_cache_hit_total").increment(1);
                Some(payload)
            }
            Ok(None) => {
                counter!("marquee_response_cache_miss_total").increment(1);
                None
            }
            Err(err) => {
                counter!("marquee_response_cache_error_total").increment(1);
                warn!(
                    target_module = SOURCE,
                    key,
                    error = %err,
                    "cache lookup failed, falling through to live computation"
                );
                None
            }
        }
    }

    /// Write a payload back under the concrete path's key, with the TTL the
    /// policy assigns to the route template. Overwrites any prior entry for
    /// the same key; failures are swallowed.
    pub async fn store(
        &self,
        route: &str,
        path: &str,
        params: &[(String, String)],
        payload: CachedPayload,
    ) {
        let key = canonical_key(path, params);
        let ttl = self.policy.ttl_for(route);
        if let Err(err) = self.store.set(&key, payload, ttl).await {
            counter!("marquee_response_cache_error_total").increment(1);
            warn!(
                target_module = SOURCE,
                key,
                error = %err,
                "cache write-back failed, entry dropped"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use async_trait::async_trait;
    use bytes::Bytes;

    use crate::cache::store::{CacheStoreError, MemoryStore};

    use super::*;

    struct BrokenStore;

    #[async_trait]
    impl CacheStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<CachedPayload>, CacheStoreError> {
            Err(CacheStoreError::Unavailable("connection refused".into()))
        }

        async fn set(
            &self,
            _key: &str,
            _value: CachedPayload,
            _ttl: Duration,
        ) -> Result<(), CacheStoreError> {
            Err(CacheStoreError::Unavailable("connection refused".into()))
        }
    }

    fn policy() -> TtlPolicy {
        let mut routes = HashMap::new();
        routes.insert("/movies".to_string(), Duration::from_secs(60));
        TtlPolicy::new(Duration::from_secs(30), routes)
    }

    fn payload(body: &str) -> CachedPayload {
        CachedPayload {
            status: 200,
            headers: vec![],
            body: Bytes::copy_from_slice(body.as_bytes()),
        }
    }

    fn params(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn store_then_lookup_returns_payload() {
        let cache = ResponseCache::new(Arc::new(MemoryStore::new(8)), policy());
        let query = params(&[("page", "1"), ("limit", "10")]);

        assert!(cache.lookup("/movies", &query).await.is_none());
        cache
            .store("/movies", "/movies", &query, payload("page-one"))
            .await;

        let hit = cache.lookup("/movies", &query).await.expect("hit");
        assert_eq!(hit.body, Bytes::from("page-one"));
    }

    #[tokio::test]
    async fn lookup_ignores_parameter_order() {
        let cache = ResponseCache::new(Arc::new(MemoryStore::new(8)), policy());
        cache
            .store(
                "/movies",
                "/movies",
                &params(&[("z", "3"), ("a", "2")]),
                payload("x"),
            )
            .await;

        assert!(
            cache
                .lookup("/movies", &params(&[("a", "2"), ("z", "3")]))
                .await
                .is_some()
        );
    }

    #[tokio::test]
    async fn entry_expires_after_route_ttl() {
        let mut routes = HashMap::new();
        routes.insert("/movies".to_string(), Duration::from_millis(10));
        let cache = ResponseCache::new(
            Arc::new(MemoryStore::new(8)),
            TtlPolicy::new(Duration::from_secs(30), routes),
        );

        cache.store("/movies", "/movies", &[], payload("stale")).await;
        tokio::time::sleep(Duration::from_millis(25)).await;
        assert!(cache.lookup("/movies", &[]).await.is_none());
    }

    #[tokio::test]
    async fn entries_are_keyed_on_path_not_route_template() {
        let mut routes = HashMap::new();
        routes.insert("/movies/{id}".to_string(), Duration::from_secs(60));
        let cache = ResponseCache::new(
            Arc::new(MemoryStore::new(8)),
            TtlPolicy::new(Duration::from_secs(30), routes),
        );

        cache
            .store("/movies/{id}", "/movies/1", &[], payload("first"))
            .await;
        cache
            .store("/movies/{id}", "/movies/2", &[], payload("second"))
            .await;

        let first = cache.lookup("/movies/1", &[]).await.expect("hit");
        let second = cache.lookup("/movies/2", &[]).await.expect("hit");
        assert_eq!(first.body, Bytes::from("first"));
        assert_eq!(second.body, Bytes::from("second"));
        assert!(cache.lookup("/movies/{id}", &[]).await.is_none());
    }

    #[tokio::test]
    async fn store_outage_degrades_to_miss() {
        let cache = ResponseCache::new(Arc::new(BrokenStore), policy());

        // Both operations absorb the failure.
        cache
            .store("/movies", "/movies", &[], payload("ignored"))
            .await;
        assert!(cache.lookup("/movies", &[]).await.is_none());
    }
}
