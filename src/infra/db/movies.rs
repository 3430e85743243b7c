use async_trait::async_trait;
use sqlx::QueryBuilder;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::filters::{CompiledQuery, FilterClause};
use crate::application::repos::{
    MoviesRepo, NewMovieParams, RatingDelta, RepoError, UpdateMovieParams,
};
use crate::domain::movies::MovieRecord;

use super::PostgresRepositories;
use super::map_sqlx_error;

#[derive(Debug, sqlx::FromRow)]
struct MovieRow {
    id: Uuid,
    title: String,
    overview: String,
    genre_ids: Vec<i32>,
    average_rating: f64,
    rate_count: i64,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<MovieRow> for MovieRecord {
    fn from(row: MovieRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            overview: row.overview,
            genre_ids: row.genre_ids,
            average_rating: row.average_rating,
            rate_count: row.rate_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const MOVIE_COLUMNS: &str = "m.id, m.title, m.overview, m.genre_ids, m.average_rating, \
     m.rate_count, m.created_at, m.updated_at";

fn apply_filter_conditions(qb: &mut QueryBuilder<'_, sqlx::Postgres>, query: &CompiledQuery) {
    for clause in query.clauses() {
        match clause {
            FilterClause::TitleContains(fragment) => {
                qb.push(" AND m.title ILIKE ");
                qb.push_bind(format!("%{fragment}%"));
            }
            FilterClause::GenresAll(ids) => {
                // `@>` is trivially true for an empty array, matching the
                // in-memory predicate.
                qb.push(" AND m.genre_ids @> ");
                qb.push_bind(ids.clone());
            }
            FilterClause::MinRating(min) => {
                qb.push(" AND m.average_rating >= ");
                qb.push_bind(*min);
            }
        }
    }
}

#[async_trait]
impl MoviesRepo for PostgresRepositories {
    async fn create(&self, params: NewMovieParams) -> Result<MovieRecord, RepoError> {
        let row = sqlx::query_as::<_, MovieRow>(
            "INSERT INTO movies (id, title, overview, genre_ids) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, title, overview, genre_ids, average_rating, rate_count, \
                       created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(&params.title)
        .bind(&params.overview)
        .bind(&params.genre_ids)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn find(
        &self,
        query: &CompiledQuery,
        skip: u64,
        limit: u32,
    ) -> Result<Vec<MovieRecord>, RepoError> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT {MOVIE_COLUMNS} FROM movies m WHERE 1=1 "
        ));
        apply_filter_conditions(&mut qb, query);
        qb.push(" ORDER BY m.created_at DESC, m.id DESC LIMIT ");
        qb.push_bind(i64::from(limit));
        qb.push(" OFFSET ");
        qb.push_bind(skip as i64);

        let rows = qb
            .build_query_as::<MovieRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(MovieRecord::from).collect())
    }

    async fn count(&self, query: &CompiledQuery) -> Result<u64, RepoError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM movies m WHERE 1=1 ");
        apply_filter_conditions(&mut qb, query);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(count.max(0) as u64)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<MovieRecord>, RepoError> {
        let row = sqlx::query_as::<_, MovieRow>(
            "SELECT id, title, overview, genre_ids, average_rating, rate_count, \
                    created_at, updated_at \
             FROM movies WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(MovieRecord::from))
    }

    async fn update(
        &self,
        id: Uuid,
        params: UpdateMovieParams,
    ) -> Result<Option<MovieRecord>, RepoError> {
        let row = sqlx::query_as::<_, MovieRow>(
            "UPDATE movies SET \
                 title = COALESCE($2, title), \
                 overview = COALESCE($3, overview), \
                 genre_ids = COALESCE($4, genre_ids), \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING id, title, overview, genre_ids, average_rating, rate_count, \
                       created_at, updated_at",
        )
        .bind(id)
        .bind(params.title)
        .bind(params.overview)
        .bind(params.genre_ids)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(MovieRecord::from))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn apply_rating_delta(&self, id: Uuid, delta: RatingDelta) -> Result<(), RepoError> {
        // Single statement so concurrent ratings serialize on the row lock;
        // both columns advance together.
        let result = sqlx::query(
            "UPDATE movies SET \
                 rate_count = rate_count + $2, \
                 average_rating = average_rating + $3, \
                 updated_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(delta.rate_count)
        .bind(delta.average_rating)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
