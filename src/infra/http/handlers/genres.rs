use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;

use super::repo_to_api;
use crate::infra::http::error::ApiError;
use crate::infra::http::models::GenreResponse;
use crate::infra::http::state::HttpState;

pub async fn list_genres(State(state): State<HttpState>) -> Result<impl IntoResponse, ApiError> {
    let genres = state.genres.list_all().await.map_err(repo_to_api)?;
    Ok(Json(
        genres
            .into_iter()
            .map(GenreResponse::from)
            .collect::<Vec<_>>(),
    ))
}
