use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{NewReviewParams, RepoError, ReviewsRepo};
use crate::domain::reviews::{ReviewRecord, ReviewWithAuthor};

use super::PostgresRepositories;
use super::map_sqlx_error;

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    user_id: Uuid,
    movie_id: Uuid,
    rating: f64,
    review_text: String,
    created_at: OffsetDateTime,
}

impl From<ReviewRow> for ReviewRecord {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            movie_id: row.movie_id,
            rating: row.rating,
            review_text: row.review_text,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReviewWithAuthorRow {
    id: Uuid,
    user_id: Uuid,
    movie_id: Uuid,
    rating: f64,
    review_text: String,
    created_at: OffsetDateTime,
    username: String,
}

impl From<ReviewWithAuthorRow> for ReviewWithAuthor {
    fn from(row: ReviewWithAuthorRow) -> Self {
        Self {
            review: ReviewRecord {
                id: row.id,
                user_id: row.user_id,
                movie_id: row.movie_id,
                rating: row.rating,
                review_text: row.review_text,
                created_at: row.created_at,
            },
            username: row.username,
        }
    }
}

#[async_trait]
impl ReviewsRepo for PostgresRepositories {
    async fn create(&self, params: NewReviewParams) -> Result<ReviewRecord, RepoError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            "INSERT INTO reviews (id, user_id, movie_id, rating, review_text) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, user_id, movie_id, rating, review_text, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(params.user_id)
        .bind(params.movie_id)
        .bind(params.rating)
        .bind(&params.review_text)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn find_by_user_and_movie(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
    ) -> Result<Option<ReviewRecord>, RepoError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            "SELECT id, user_id, movie_id, rating, review_text, created_at \
             FROM reviews WHERE user_id = $1 AND movie_id = $2",
        )
        .bind(user_id)
        .bind(movie_id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(ReviewRecord::from))
    }

    async fn list_for_movie(&self, movie_id: Uuid) -> Result<Vec<ReviewWithAuthor>, RepoError> {
        let rows = sqlx::query_as::<_, ReviewWithAuthorRow>(
            "SELECT r.id, r.user_id, r.movie_id, r.rating, r.review_text, r.created_at, \
                    u.username \
             FROM reviews r \
             JOIN users u ON u.id = r.user_id \
             WHERE r.movie_id = $1 \
             ORDER BY r.created_at DESC, r.id DESC",
        )
        .bind(movie_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ReviewWithAuthor::from).collect())
    }
}
