//! Response cache middleware.
//!
//! Wraps catalog read routes: a hit serves the cached response without
//! touching the handler; a miss runs the handler and writes 200 responses
//! back through [`ResponseCache`]. Two concurrent misses may both compute
//! and store; the second write simply overwrites the first.
//!
//! Entries are keyed on the concrete request path, so parameterized routes
//! cache each resource separately; the route template is used only for the
//! allowlist check and the TTL lookup.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body::Body as _;
use tracing::{debug, instrument, warn};

use super::keys::split_query;
use super::response::ResponseCache;
use super::store::CachedPayload;

const MAX_CACHEABLE_BODY_BYTES: u64 = 2 * 1024 * 1024;

/// Shared cache state for the middleware layer.
#[derive(Clone)]
pub struct CacheState {
    pub enabled: bool,
    /// Route templates eligible for response caching.
    pub routes: Arc<HashSet<String>>,
    pub cache: Arc<ResponseCache>,
}

impl CacheState {
    pub fn new(enabled: bool, routes: impl IntoIterator<Item = String>, cache: ResponseCache) -> Self {
        Self {
            enabled,
            routes: Arc::new(routes.into_iter().collect()),
            cache: Arc::new(cache),
        }
    }
}

#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn response_cache_layer(
    State(state): State<CacheState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.enabled || request.method() != Method::GET {
        return next.run(request).await;
    }

    let route = match request.extensions().get::<MatchedPath>() {
        Some(matched) => matched.as_str().to_string(),
        None => request.uri().path().to_string(),
    };
    if !state.routes.contains(&route) {
        return next.run(request).await;
    }

    let path = request.uri().path().to_string();
    let params = split_query(request.uri().query().unwrap_or(""));

    if let Some(cached) = state.cache.lookup(&path, &params).await {
        debug!(cache = "response", outcome = "hit", route, path, "serving cached response");
        return build_response(cached);
    }

    debug!(cache = "response", outcome = "miss", route, path, "executing handler");

    let response = next.run(request).await;

    if response.status() != StatusCode::OK {
        return response;
    }

    let (parts, body) = response.into_parts();

    // Only bodies with a known size within the cap are buffered. Anything
    // else (streaming, oversized) is streamed through uncached; the cache
    // must never cost the client a valid response.
    let cacheable = body
        .size_hint()
        .upper()
        .is_some_and(|len| len <= MAX_CACHEABLE_BODY_BYTES);
    if !cacheable {
        debug!(
            cache = "response",
            outcome = "skip",
            route,
            path,
            "response body unsized or over cap, skipping write-back"
        );
        return Response::from_parts(parts, body);
    }

    let bytes = match axum::body::to_bytes(body, MAX_CACHEABLE_BODY_BYTES as usize).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(cache = "response", route, path, error = %err, "response body failed mid-read");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let payload = CachedPayload {
        status: parts.status.as_u16(),
        headers: parts
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect(),
        body: bytes.clone(),
    };

    state.cache.store(&route, &path, &params, payload).await;

    Response::from_parts(parts, Body::from(bytes))
}

fn build_response(cached: CachedPayload) -> Response {
    use axum::http::HeaderValue;

    let mut builder = Response::builder().status(cached.status);
    for (name, value) in cached.headers {
        if let Ok(header_value) = HeaderValue::from_str(&value) {
            builder = builder.header(name, header_value);
        }
    }

    builder
        .body(Body::from(cached.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
