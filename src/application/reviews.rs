//! Review submission flow.
//!
//! Uniqueness (one review per user per movie) is enforced here, before the
//! rating aggregator runs; the aggregator itself performs no duplicate
//! detection.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::application::movies::{MovieError, MovieService};
use crate::application::repos::{NewReviewParams, RepoError, ReviewsRepo};
use crate::domain::movies;
use crate::domain::reviews::{ReviewRecord, ReviewWithAuthor};

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("movie not found")]
    MovieNotFound,
    #[error("user has already reviewed this movie")]
    AlreadyReviewed,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<MovieError> for ReviewError {
    fn from(err: MovieError) -> Self {
        match err {
            MovieError::NotFound => Self::MovieNotFound,
            MovieError::InvalidInput(message) => Self::InvalidInput(message),
            MovieError::Repo(err) => Self::Repo(err),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateReviewCommand {
    pub movie_id: Uuid,
    pub rating: f64,
    pub review_text: String,
}

#[derive(Clone)]
pub struct ReviewService {
    reviews: Arc<dyn ReviewsRepo>,
    movies: Arc<MovieService>,
}

impl ReviewService {
    pub fn new(reviews: Arc<dyn ReviewsRepo>, movies: Arc<MovieService>) -> Self {
        Self { reviews, movies }
    }

    pub async fn create_review(
        &self,
        user_id: Uuid,
        command: CreateReviewCommand,
    ) -> Result<ReviewRecord, ReviewError> {
        movies::validate_rating(command.rating)
            .map_err(|err| ReviewError::InvalidInput(err.to_string()))?;

        self.movies.find_one(command.movie_id).await?;

        if self
            .reviews
            .find_by_user_and_movie(user_id, command.movie_id)
            .await?
            .is_some()
        {
            return Err(ReviewError::AlreadyReviewed);
        }

        let review = self
            .reviews
            .create(NewReviewParams {
                user_id,
                movie_id: command.movie_id,
                rating: command.rating,
                review_text: command.review_text,
            })
            .await
            .map_err(|err| match err {
                // Concurrent submission lost the race on the unique index.
                RepoError::Duplicate { .. } => ReviewError::AlreadyReviewed,
                other => ReviewError::Repo(other),
            })?;

        self.movies
            .record_rating(command.movie_id, command.rating)
            .await?;

        Ok(review)
    }

    pub async fn list_for_movie(
        &self,
        movie_id: Uuid,
    ) -> Result<Vec<ReviewWithAuthor>, ReviewError> {
        self.movies.find_one(movie_id).await?;
        self.reviews
            .list_for_movie(movie_id)
            .await
            .map_err(ReviewError::from)
    }
}
