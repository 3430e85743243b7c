//! Deterministic cache key derivation.
//!
//! Two requests that differ only in query-parameter order must land on the
//! same cache entry, so parameters are sorted by name before serialization.

/// Build the canonical cache key for a route path and its query parameters.
///
/// Any query string already present on `path` is stripped. Parameters are
/// sorted lexicographically by name and serialized as `name=value` joined by
/// `&`; values are used verbatim. An empty parameter set yields the bare
/// path with no `?` suffix.
pub fn canonical_key(path: &str, params: &[(String, String)]) -> String {
    let base = path.split('?').next().unwrap_or(path);
    if params.is_empty() {
        return base.to_string();
    }

    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let serialized = sorted
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    format!("{base}?{serialized}")
}

/// Split a raw query string into name/value pairs, verbatim and undecoded.
pub fn split_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((name, value)) => (name.to_string(), value.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parameter_order_never_changes_the_key() {
        let forward = canonical_key("/movies", &pairs(&[("z", "3"), ("b", "1"), ("a", "2")]));
        let reverse = canonical_key("/movies", &pairs(&[("a", "2"), ("b", "1"), ("z", "3")]));

        assert_eq!(forward, "/movies?a=2&b=1&z=3");
        assert_eq!(forward, reverse);
    }

    #[test]
    fn empty_params_yield_bare_path() {
        assert_eq!(canonical_key("/movies", &[]), "/movies");
    }

    #[test]
    fn existing_query_string_is_stripped() {
        let key = canonical_key("/movies?b=1&a=2", &pairs(&[("b", "1"), ("a", "2")]));
        assert_eq!(key, "/movies?a=2&b=1");
    }

    #[test]
    fn values_are_used_verbatim() {
        let key = canonical_key("/movies", &pairs(&[("filters", "%5B%7B%22field%22")]));
        assert_eq!(key, "/movies?filters=%5B%7B%22field%22");
    }

    #[test]
    fn split_query_keeps_raw_values() {
        assert_eq!(
            split_query("b=2&a=1&flag"),
            pairs(&[("b", "2"), ("a", "1"), ("flag", "")])
        );
        assert!(split_query("").is_empty());
    }
}
