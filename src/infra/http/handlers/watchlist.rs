use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::users::UserPrincipal;

use super::watchlist_to_api;
use crate::infra::http::error::ApiError;
use crate::infra::http::models::{
    WatchlistAddRequest, WatchlistAddedResponse, WatchlistEntryResponse,
};
use crate::infra::http::state::HttpState;

pub async fn add_to_watchlist(
    State(state): State<HttpState>,
    Extension(principal): Extension<UserPrincipal>,
    Json(payload): Json<WatchlistAddRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = state
        .watchlist
        .add(principal.user_id, payload.movie_id)
        .await
        .map_err(watchlist_to_api)?;

    Ok((StatusCode::CREATED, Json(WatchlistAddedResponse::from(entry))))
}

pub async fn list_watchlist(
    State(state): State<HttpState>,
    Extension(principal): Extension<UserPrincipal>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = state
        .watchlist
        .list(principal.user_id)
        .await
        .map_err(watchlist_to_api)?;

    Ok(Json(
        entries
            .into_iter()
            .map(WatchlistEntryResponse::from)
            .collect::<Vec<_>>(),
    ))
}
