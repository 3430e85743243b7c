use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{RepoError, WatchlistRepo};
use crate::domain::movies::MovieRecord;
use crate::domain::watchlist::WatchlistEntryRecord;

use super::PostgresRepositories;
use super::map_sqlx_error;

#[derive(Debug, sqlx::FromRow)]
struct EntryRow {
    id: Uuid,
    user_id: Uuid,
    movie_id: Uuid,
    created_at: OffsetDateTime,
}

impl From<EntryRow> for WatchlistEntryRecord {
    fn from(row: EntryRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            movie_id: row.movie_id,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EntryWithMovieRow {
    id: Uuid,
    user_id: Uuid,
    movie_id: Uuid,
    created_at: OffsetDateTime,
    m_title: String,
    m_overview: String,
    m_genre_ids: Vec<i32>,
    m_average_rating: f64,
    m_rate_count: i64,
    m_created_at: OffsetDateTime,
    m_updated_at: OffsetDateTime,
}

impl From<EntryWithMovieRow> for (WatchlistEntryRecord, MovieRecord) {
    fn from(row: EntryWithMovieRow) -> Self {
        (
            WatchlistEntryRecord {
                id: row.id,
                user_id: row.user_id,
                movie_id: row.movie_id,
                created_at: row.created_at,
            },
            MovieRecord {
                id: row.movie_id,
                title: row.m_title,
                overview: row.m_overview,
                genre_ids: row.m_genre_ids,
                average_rating: row.m_average_rating,
                rate_count: row.m_rate_count,
                created_at: row.m_created_at,
                updated_at: row.m_updated_at,
            },
        )
    }
}

#[async_trait]
impl WatchlistRepo for PostgresRepositories {
    async fn add(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
    ) -> Result<WatchlistEntryRecord, RepoError> {
        let row = sqlx::query_as::<_, EntryRow>(
            "INSERT INTO watchlist_entries (id, user_id, movie_id) \
             VALUES ($1, $2, $3) \
             RETURNING id, user_id, movie_id, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(movie_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn find_entry(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
    ) -> Result<Option<WatchlistEntryRecord>, RepoError> {
        let row = sqlx::query_as::<_, EntryRow>(
            "SELECT id, user_id, movie_id, created_at \
             FROM watchlist_entries WHERE user_id = $1 AND movie_id = $2",
        )
        .bind(user_id)
        .bind(movie_id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(WatchlistEntryRecord::from))
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<(WatchlistEntryRecord, MovieRecord)>, RepoError> {
        let rows = sqlx::query_as::<_, EntryWithMovieRow>(
            "SELECT w.id, w.user_id, w.movie_id, w.created_at, \
                    m.title AS m_title, m.overview AS m_overview, \
                    m.genre_ids AS m_genre_ids, m.average_rating AS m_average_rating, \
                    m.rate_count AS m_rate_count, m.created_at AS m_created_at, \
                    m.updated_at AS m_updated_at \
             FROM watchlist_entries w \
             JOIN movies m ON m.id = w.movie_id \
             WHERE w.user_id = $1 \
             ORDER BY w.created_at DESC, w.id DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
