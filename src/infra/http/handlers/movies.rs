//! Movie catalog handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::filters::{self, FilterDescriptor, FilterError};
use crate::application::movies::{CreateMovieCommand, UpdateMovieCommand};

use super::movie_to_api;
use crate::infra::http::error::ApiError;
use crate::infra::http::models::*;
use crate::infra::http::state::HttpState;

pub async fn create_movie(
    State(state): State<HttpState>,
    Json(payload): Json<CreateMovieRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let movie = state
        .movies
        .create(CreateMovieCommand {
            title: payload.title,
            overview: payload.overview,
            genre_ids: payload.genre_ids,
        })
        .await
        .map_err(movie_to_api)?;

    Ok((StatusCode::CREATED, Json(MovieResponse::from(movie))))
}

pub async fn list_movies(
    State(state): State<HttpState>,
    Query(query): Query<MovieListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query.page.unwrap_or(1);
    let limit = query
        .limit
        .unwrap_or(state.default_page_size.max(1))
        .clamp(1, 100);

    let descriptors = parse_filters(query.filters.as_deref())?;

    let listing = state
        .movies
        .find_all(page, limit, descriptors)
        .await
        .map_err(movie_to_api)?;

    Ok(Json(MovieIndexResponse {
        movies: listing.movies.into_iter().map(MovieResponse::from).collect(),
        total_pages: listing.total_pages,
        total_count: listing.total_count,
    }))
}

pub async fn get_movie(
    State(state): State<HttpState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let movie = state.movies.find_one(id).await.map_err(movie_to_api)?;
    Ok(Json(MovieResponse::from(movie)))
}

pub async fn update_movie(
    State(state): State<HttpState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMovieRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let movie = state
        .movies
        .update(
            id,
            UpdateMovieCommand {
                title: payload.title,
                overview: payload.overview,
                genre_ids: payload.genre_ids,
            },
        )
        .await
        .map_err(movie_to_api)?;

    Ok(Json(MovieResponse::from(movie)))
}

pub async fn delete_movie(
    State(state): State<HttpState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.movies.remove(id).await.map_err(movie_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_filters(raw: Option<&str>) -> Result<Vec<FilterDescriptor>, ApiError> {
    match raw {
        None => Ok(Vec::new()),
        Some(raw) => filters::parse_descriptors(raw).map_err(|err| match err {
            FilterError::Malformed(hint) => {
                ApiError::bad_request("malformed filters parameter", Some(hint))
            }
            FilterError::Repo(err) => super::repo_to_api(err),
        }),
    }
}
