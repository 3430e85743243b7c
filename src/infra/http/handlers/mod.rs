mod genres;
mod movies;
mod reviews;
mod users;
mod watchlist;

pub use genres::list_genres;
pub use movies::{create_movie, delete_movie, get_movie, list_movies, update_movie};
pub use reviews::{create_review, list_movie_reviews};
pub use users::{login, register};
pub use watchlist::{add_to_watchlist, list_watchlist};

use crate::application::movies::MovieError;
use crate::application::repos::RepoError;
use crate::application::reviews::ReviewError;
use crate::application::users::UserError;
use crate::application::watchlist::WatchlistError;

use super::error::{ApiError, codes};

fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::NotFound => ApiError::not_found("resource not found"),
        RepoError::Duplicate { constraint } => {
            ApiError::new(
                axum::http::StatusCode::CONFLICT,
                codes::CONFLICT,
                "duplicate resource",
                Some(constraint),
            )
        }
        RepoError::Integrity { message } => ApiError::internal(codes::INTEGRITY, Some(message)),
        RepoError::Persistence(message) => ApiError::internal(codes::REPO, Some(message)),
    }
}

fn movie_to_api(err: MovieError) -> ApiError {
    match err {
        MovieError::NotFound => ApiError::not_found("movie not found"),
        MovieError::InvalidInput(hint) => ApiError::invalid_input(Some(hint)),
        MovieError::Repo(err) => repo_to_api(err),
    }
}

fn review_to_api(err: ReviewError) -> ApiError {
    match err {
        ReviewError::MovieNotFound => ApiError::not_found("movie not found"),
        ReviewError::AlreadyReviewed => ApiError::conflict("movie already reviewed by this user"),
        ReviewError::InvalidInput(hint) => ApiError::invalid_input(Some(hint)),
        ReviewError::Repo(err) => repo_to_api(err),
    }
}

fn watchlist_to_api(err: WatchlistError) -> ApiError {
    match err {
        WatchlistError::MovieNotFound => ApiError::not_found("movie not found"),
        WatchlistError::AlreadyListed => ApiError::conflict("movie already in watchlist"),
        WatchlistError::Repo(err) => repo_to_api(err),
    }
}

fn user_to_api(err: UserError) -> ApiError {
    match err {
        UserError::UsernameTaken => ApiError::conflict("username already taken"),
        UserError::InvalidCredentials => ApiError::unauthorized("invalid credentials"),
        UserError::InvalidInput(hint) => ApiError::invalid_input(Some(hint)),
        UserError::Repo(err) => repo_to_api(err),
    }
}
