//! Per-route TTL policy.

use std::collections::HashMap;
use std::time::Duration;

use crate::config::CacheSettings;

/// Maps route identifiers to entry TTLs, with a default for routes that have
/// no explicit entry. Built once at startup and read-only thereafter.
#[derive(Debug, Clone)]
pub struct TtlPolicy {
    routes: HashMap<String, Duration>,
    default_ttl: Duration,
}

impl TtlPolicy {
    pub fn new(default_ttl: Duration, routes: HashMap<String, Duration>) -> Self {
        Self {
            routes,
            default_ttl,
        }
    }

    /// TTL for a route, falling back to the default when the route has no
    /// dedicated entry.
    pub fn ttl_for(&self, route: &str) -> Duration {
        self.routes
            .get(route)
            .copied()
            .unwrap_or(self.default_ttl)
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

impl From<&CacheSettings> for TtlPolicy {
    fn from(settings: &CacheSettings) -> Self {
        let routes = settings
            .ttl_ms
            .iter()
            .map(|(route, ms)| (route.clone(), Duration::from_millis(*ms)))
            .collect();
        Self::new(Duration::from_millis(settings.default_ttl_ms), routes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> TtlPolicy {
        let mut routes = HashMap::new();
        routes.insert("/movies".to_string(), Duration::from_secs(60));
        TtlPolicy::new(Duration::from_secs(30), routes)
    }

    #[test]
    fn known_route_uses_its_ttl() {
        assert_eq!(policy().ttl_for("/movies"), Duration::from_secs(60));
    }

    #[test]
    fn unknown_route_falls_back_to_default() {
        assert_eq!(policy().ttl_for("/genres"), Duration::from_secs(30));
    }
}
