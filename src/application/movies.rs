//! Movie catalog service: CRUD, filtered listing, and the online rating
//! aggregator.

use std::sync::Arc;

use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use crate::application::filters::{self, FilterDescriptor, FilterError};
use crate::application::repos::{
    GenreResolver, MoviesRepo, NewMovieParams, RatingDelta, RepoError, UpdateMovieParams,
};
use crate::domain::movies::{self, MovieRecord};

#[derive(Debug, Error)]
pub enum MovieError {
    #[error("movie not found")]
    NotFound,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<FilterError> for MovieError {
    fn from(err: FilterError) -> Self {
        match err {
            FilterError::Malformed(message) => Self::InvalidInput(message),
            FilterError::Repo(err) => Self::Repo(err),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateMovieCommand {
    pub title: String,
    pub overview: String,
    pub genre_ids: Vec<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateMovieCommand {
    pub title: Option<String>,
    pub overview: Option<String>,
    pub genre_ids: Option<Vec<i32>>,
}

/// One page of the catalog listing.
#[derive(Debug, Clone)]
pub struct MovieListing {
    pub movies: Vec<MovieRecord>,
    pub total_pages: u32,
    pub total_count: u64,
}

#[derive(Clone)]
pub struct MovieService {
    movies: Arc<dyn MoviesRepo>,
    genres: Arc<dyn GenreResolver>,
}

impl MovieService {
    pub fn new(movies: Arc<dyn MoviesRepo>, genres: Arc<dyn GenreResolver>) -> Self {
        Self { movies, genres }
    }

    pub async fn create(&self, command: CreateMovieCommand) -> Result<MovieRecord, MovieError> {
        let title = command.title.trim().to_string();
        if title.is_empty() {
            return Err(MovieError::InvalidInput("title must not be empty".into()));
        }

        // New movies start with an empty rating aggregate; the repository
        // seeds average_rating = 0 and rate_count = 0.
        self.movies
            .create(NewMovieParams {
                title,
                overview: command.overview,
                genre_ids: command.genre_ids,
            })
            .await
            .map_err(MovieError::from)
    }

    /// Paginated catalog listing. Compiles the filter descriptors (resolving
    /// genre names through the resolver), then fetches the page and the total
    /// count concurrently against the same predicate.
    #[instrument(skip(self, descriptors), fields(page, limit))]
    pub async fn find_all(
        &self,
        page: u32,
        limit: u32,
        descriptors: Vec<FilterDescriptor>,
    ) -> Result<MovieListing, MovieError> {
        let page = page.max(1);
        let limit = limit.max(1);
        let skip = u64::from(page - 1) * u64::from(limit);

        let query = filters::compile(&descriptors, self.genres.as_ref()).await?;

        let (movies, total_count) = futures::try_join!(
            self.movies.find(&query, skip, limit),
            self.movies.count(&query),
        )?;

        let total_pages = total_count.div_ceil(u64::from(limit)) as u32;

        Ok(MovieListing {
            movies,
            total_pages,
            total_count,
        })
    }

    pub async fn find_one(&self, id: Uuid) -> Result<MovieRecord, MovieError> {
        self.movies
            .find_by_id(id)
            .await?
            .ok_or(MovieError::NotFound)
    }

    pub async fn update(
        &self,
        id: Uuid,
        command: UpdateMovieCommand,
    ) -> Result<MovieRecord, MovieError> {
        if let Some(title) = &command.title
            && title.trim().is_empty()
        {
            return Err(MovieError::InvalidInput("title must not be empty".into()));
        }

        self.movies
            .update(
                id,
                UpdateMovieParams {
                    title: command.title,
                    overview: command.overview,
                    genre_ids: command.genre_ids,
                },
            )
            .await?
            .ok_or(MovieError::NotFound)
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), MovieError> {
        if self.movies.delete(id).await? {
            Ok(())
        } else {
            Err(MovieError::NotFound)
        }
    }

    /// Record one rating sample into the movie's running aggregate.
    ///
    /// Reads the current aggregate, derives the streaming-mean delta, and
    /// hands both increments to the store as a single atomic operation. The
    /// store's per-row serialization is the only synchronization point; no
    /// retries are attempted since the delta is only valid against current
    /// state.
    #[instrument(skip(self))]
    pub async fn record_rating(&self, id: Uuid, rating: f64) -> Result<(), MovieError> {
        movies::validate_rating(rating)
            .map_err(|err| MovieError::InvalidInput(err.to_string()))?;

        let movie = self.find_one(id).await?;
        let delta = movies::rating_delta(movie.average_rating, movie.rate_count, rating);

        self.movies
            .apply_rating_delta(
                id,
                RatingDelta {
                    rate_count: 1,
                    average_rating: delta,
                },
            )
            .await
            .map_err(|err| match err {
                RepoError::NotFound => MovieError::NotFound,
                other => MovieError::Repo(other),
            })?;

        metrics::counter!("marquee_ratings_recorded_total").increment(1);
        Ok(())
    }
}
