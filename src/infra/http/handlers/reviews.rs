//! Review handlers.

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::reviews::CreateReviewCommand;
use crate::application::users::UserPrincipal;

use super::review_to_api;
use crate::infra::http::error::ApiError;
use crate::infra::http::models::{CreateReviewRequest, ReviewResponse};
use crate::infra::http::state::HttpState;

pub async fn create_review(
    State(state): State<HttpState>,
    Extension(principal): Extension<UserPrincipal>,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let review = state
        .reviews
        .create_review(
            principal.user_id,
            CreateReviewCommand {
                movie_id: payload.movie_id,
                rating: payload.rating,
                review_text: payload.review_text,
            },
        )
        .await
        .map_err(review_to_api)?;

    let response = ReviewResponse {
        id: review.id,
        movie_id: review.movie_id,
        rating: review.rating,
        review_text: review.review_text,
        username: Some(principal.username),
        created_at: review.created_at,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn list_movie_reviews(
    State(state): State<HttpState>,
    Path(movie_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let reviews = state
        .reviews
        .list_for_movie(movie_id)
        .await
        .map_err(review_to_api)?;

    Ok(Json(
        reviews
            .into_iter()
            .map(ReviewResponse::from)
            .collect::<Vec<_>>(),
    ))
}
