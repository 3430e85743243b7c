use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::genres::GenreRecord;
use crate::domain::movies::MovieRecord;
use crate::domain::reviews::ReviewWithAuthor;
use crate::domain::users::UserRecord;
use crate::domain::watchlist::WatchlistEntryRecord;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMovieRequest {
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub genre_ids: Vec<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMovieRequest {
    pub title: Option<String>,
    pub overview: Option<String>,
    pub genre_ids: Option<Vec<i32>>,
}

#[derive(Debug, Deserialize)]
pub struct MovieListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// JSON array of `{field, value}` descriptors, passed verbatim.
    pub filters: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieResponse {
    pub id: Uuid,
    pub title: String,
    pub overview: String,
    pub genre_ids: Vec<i32>,
    pub average_rating: f64,
    pub rate_count: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<MovieRecord> for MovieResponse {
    fn from(record: MovieRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            overview: record.overview,
            genre_ids: record.genre_ids,
            average_rating: record.average_rating,
            rate_count: record.rate_count,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieIndexResponse {
    pub movies: Vec<MovieResponse>,
    pub total_pages: u32,
    pub total_count: u64,
}

#[derive(Debug, Serialize)]
pub struct GenreResponse {
    pub id: i32,
    pub name: String,
}

impl From<GenreRecord> for GenreResponse {
    fn from(record: GenreRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub movie_id: Uuid,
    pub rating: f64,
    #[serde(default)]
    pub review_text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub id: Uuid,
    pub movie_id: Uuid,
    pub rating: f64,
    pub review_text: String,
    pub username: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<ReviewWithAuthor> for ReviewResponse {
    fn from(value: ReviewWithAuthor) -> Self {
        Self {
            id: value.review.id,
            movie_id: value.review.movie_id,
            rating: value.review.rating,
            review_text: value.review.review_text,
            username: Some(value.username),
            created_at: value.review.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistAddRequest {
    pub movie_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistAddedResponse {
    pub id: Uuid,
    pub movie_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub added_at: OffsetDateTime,
}

impl From<WatchlistEntryRecord> for WatchlistAddedResponse {
    fn from(entry: WatchlistEntryRecord) -> Self {
        Self {
            id: entry.id,
            movie_id: entry.movie_id,
            added_at: entry.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistEntryResponse {
    pub id: Uuid,
    pub movie: MovieResponse,
    #[serde(with = "time::serde::rfc3339")]
    pub added_at: OffsetDateTime,
}

impl From<(WatchlistEntryRecord, MovieRecord)> for WatchlistEntryResponse {
    fn from((entry, movie): (WatchlistEntryRecord, MovieRecord)) -> Self {
        Self {
            id: entry.id,
            movie: movie.into(),
            added_at: entry.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<UserRecord> for UserResponse {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            username: record.username,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}
