use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;
use tracing::{error, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;
use crate::application::users::{AuthError, UserPrincipal};

use super::error::ApiError;
use super::state::HttpState;

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let ctx = RequestContext {
        request_id: request_id.clone(),
    };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(ctx);
    response
}

/// Gate every route behind a static API key, taken from the `x-api-key`
/// header or an `apiKey` query parameter. An empty configured key list
/// disables the gate entirely.
pub async fn require_api_key(
    State(state): State<HttpState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if state.api_keys.is_empty() {
        return next.run(request).await;
    }

    let presented = request
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| query_param(request.uri().query(), "apiKey"));

    let Some(presented) = presented else {
        return ApiError::unauthorized("API key required").into_response();
    };

    let accepted = state
        .api_keys
        .iter()
        .any(|key| constant_time_eq(key, &presented));
    if !accepted {
        return ApiError::unauthorized("invalid API key").into_response();
    }

    next.run(request).await
}

/// Resolve the bearer token into a [`UserPrincipal`] and attach it to the
/// request. Routes behind this layer can rely on the extension being present.
pub async fn require_user(
    State(state): State<HttpState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = extract_bearer(request.headers().get(axum::http::header::AUTHORIZATION));

    let Some(token) = token else {
        return ApiError::unauthorized("bearer token required").into_response();
    };

    let principal = match state.users.authenticate(&token).await {
        Ok(principal) => principal,
        Err(AuthError::Expired) => {
            return ApiError::unauthorized("session expired").into_response();
        }
        Err(AuthError::Missing) | Err(AuthError::Invalid) => {
            return ApiError::unauthorized("invalid bearer token").into_response();
        }
    };

    request.extensions_mut().insert(principal);
    next.run(request).await
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let user_id = request
        .extensions()
        .get::<UserPrincipal>()
        .map(|principal| principal.user_id.to_string());

    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let status = response.status();

    if status.is_client_error() || status.is_server_error() {
        let elapsed_ms = start.elapsed().as_millis();
        let report = response.extensions_mut().remove::<ErrorReport>();
        let (source, messages) = match report {
            Some(report) => (report.source, report.messages),
            None => ("unknown", Vec::new()),
        };
        let detail = messages
            .first()
            .cloned()
            .unwrap_or_else(|| "no diagnostic available".to_string());

        if status.is_server_error() {
            error!(
                target = "marquee::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = request_id,
                user_id = user_id.as_deref().unwrap_or(""),
                "request failed"
            );
        } else {
            warn!(
                target = "marquee::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                request_id = request_id,
                user_id = user_id.as_deref().unwrap_or(""),
                "request rejected"
            );
        }
    }

    response
}

fn extract_bearer(header: Option<&axum::http::HeaderValue>) -> Option<String> {
    let raw = header?.to_str().ok()?;
    let bearer = raw.strip_prefix("Bearer ")?;
    Some(bearer.to_string())
}

fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    query?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
