//! Marquee response cache.
//!
//! A read-through cache over catalog read routes:
//!
//! - [`keys::canonical_key`] derives a deterministic cache key from a route
//!   path and its query parameters, independent of parameter order.
//! - [`TtlPolicy`] maps route identifiers to TTLs with a default fallback,
//!   built once from configuration and injected read-only.
//! - [`CacheStore`] is the key/value collaborator contract (get, set with
//!   TTL); [`MemoryStore`] is the in-process implementation.
//! - [`ResponseCache`] ties the three together and is fail-open: a store
//!   outage degrades to a cache miss, never a failed request.
//!
//! There is deliberately no invalidation on writes. Entries go stale until
//! their TTL elapses; the TTL table is the only freshness control.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! capacity = 512
//! default_ttl_ms = 30000
//! routes = ["/movies", "/genres"]
//!
//! [cache.ttl_ms]
//! "/movies" = 60000
//! ```

pub mod keys;
mod lock;
mod middleware;
mod policy;
mod response;
mod store;

pub use middleware::{CacheState, response_cache_layer};
pub use policy::TtlPolicy;
pub use response::ResponseCache;
pub use store::{CacheStore, CacheStoreError, CachedPayload, MemoryStore};
