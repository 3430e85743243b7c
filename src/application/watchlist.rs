//! Per-user watchlists.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::application::movies::{MovieError, MovieService};
use crate::application::repos::{RepoError, WatchlistRepo};
use crate::domain::movies::MovieRecord;
use crate::domain::watchlist::WatchlistEntryRecord;

#[derive(Debug, Error)]
pub enum WatchlistError {
    #[error("movie not found")]
    MovieNotFound,
    #[error("movie already in watchlist")]
    AlreadyListed,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<MovieError> for WatchlistError {
    fn from(err: MovieError) -> Self {
        match err {
            MovieError::NotFound => Self::MovieNotFound,
            MovieError::InvalidInput(message) => Self::Repo(RepoError::integrity(message)),
            MovieError::Repo(err) => Self::Repo(err),
        }
    }
}

#[derive(Clone)]
pub struct WatchlistService {
    watchlist: Arc<dyn WatchlistRepo>,
    movies: Arc<MovieService>,
}

impl WatchlistService {
    pub fn new(watchlist: Arc<dyn WatchlistRepo>, movies: Arc<MovieService>) -> Self {
        Self { watchlist, movies }
    }

    pub async fn add(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
    ) -> Result<WatchlistEntryRecord, WatchlistError> {
        self.movies.find_one(movie_id).await?;

        if self
            .watchlist
            .find_entry(user_id, movie_id)
            .await?
            .is_some()
        {
            return Err(WatchlistError::AlreadyListed);
        }

        self.watchlist
            .add(user_id, movie_id)
            .await
            .map_err(|err| match err {
                RepoError::Duplicate { .. } => WatchlistError::AlreadyListed,
                other => WatchlistError::Repo(other),
            })
    }

    pub async fn list(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<(WatchlistEntryRecord, MovieRecord)>, WatchlistError> {
        self.watchlist
            .list_for_user(user_id)
            .await
            .map_err(WatchlistError::from)
    }
}
