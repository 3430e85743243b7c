//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::filters::CompiledQuery;
use crate::domain::genres::GenreRecord;
use crate::domain::movies::MovieRecord;
use crate::domain::reviews::{ReviewRecord, ReviewWithAuthor};
use crate::domain::users::{SessionRecord, UserRecord};
use crate::domain::watchlist::WatchlistEntryRecord;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("integrity error: {message}")]
    Integrity { message: String },
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewMovieParams {
    pub title: String,
    pub overview: String,
    pub genre_ids: Vec<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateMovieParams {
    pub title: Option<String>,
    pub overview: Option<String>,
    pub genre_ids: Option<Vec<i32>>,
}

/// Deltas applied to a movie's rating aggregate as one indivisible store
/// operation. Both columns move together or not at all.
#[derive(Debug, Clone, Copy)]
pub struct RatingDelta {
    pub rate_count: i64,
    pub average_rating: f64,
}

#[async_trait]
pub trait MoviesRepo: Send + Sync {
    async fn create(&self, params: NewMovieParams) -> Result<MovieRecord, RepoError>;

    /// Fetch movies matching the compiled predicate, skipping `skip` rows and
    /// returning at most `limit`.
    async fn find(
        &self,
        query: &CompiledQuery,
        skip: u64,
        limit: u32,
    ) -> Result<Vec<MovieRecord>, RepoError>;

    async fn count(&self, query: &CompiledQuery) -> Result<u64, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<MovieRecord>, RepoError>;

    async fn update(
        &self,
        id: Uuid,
        params: UpdateMovieParams,
    ) -> Result<Option<MovieRecord>, RepoError>;

    /// Returns true when a row was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, RepoError>;

    /// Apply both rating deltas atomically. The store serializes concurrent
    /// increments per movie row; callers must never split this into a read
    /// followed by a write.
    async fn apply_rating_delta(&self, id: Uuid, delta: RatingDelta) -> Result<(), RepoError>;
}

/// Maps genre names to their numeric ids. Names that match nothing are
/// omitted from the result rather than reported as errors.
#[async_trait]
pub trait GenreResolver: Send + Sync {
    async fn resolve_names(&self, names: &[String]) -> Result<Vec<i32>, RepoError>;

    async fn list_all(&self) -> Result<Vec<GenreRecord>, RepoError>;
}

#[derive(Debug, Clone)]
pub struct NewReviewParams {
    pub user_id: Uuid,
    pub movie_id: Uuid,
    pub rating: f64,
    pub review_text: String,
}

#[async_trait]
pub trait ReviewsRepo: Send + Sync {
    async fn create(&self, params: NewReviewParams) -> Result<ReviewRecord, RepoError>;

    async fn find_by_user_and_movie(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
    ) -> Result<Option<ReviewRecord>, RepoError>;

    async fn list_for_movie(&self, movie_id: Uuid) -> Result<Vec<ReviewWithAuthor>, RepoError>;
}

#[async_trait]
pub trait WatchlistRepo: Send + Sync {
    async fn add(&self, user_id: Uuid, movie_id: Uuid)
    -> Result<WatchlistEntryRecord, RepoError>;

    async fn find_entry(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
    ) -> Result<Option<WatchlistEntryRecord>, RepoError>;

    async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<(WatchlistEntryRecord, MovieRecord)>, RepoError>;
}

#[derive(Debug, Clone)]
pub struct NewUserParams {
    pub name: String,
    pub username: String,
    pub password_digest: String,
    pub password_salt: String,
}

#[derive(Debug, Clone)]
pub struct NewSessionParams {
    pub user_id: Uuid,
    pub prefix: String,
    pub hashed_secret: String,
    pub expires_at: OffsetDateTime,
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn create(&self, params: NewUserParams) -> Result<UserRecord, RepoError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError>;

    async fn create_session(&self, params: NewSessionParams)
    -> Result<SessionRecord, RepoError>;

    async fn find_session_by_prefix(
        &self,
        prefix: &str,
    ) -> Result<Option<SessionRecord>, RepoError>;
}
