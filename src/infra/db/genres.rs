use async_trait::async_trait;

use crate::application::repos::{GenreResolver, RepoError};
use crate::domain::genres::GenreRecord;

use super::PostgresRepositories;
use super::map_sqlx_error;

#[derive(Debug, sqlx::FromRow)]
struct GenreRow {
    id: i32,
    name: String,
}

impl From<GenreRow> for GenreRecord {
    fn from(row: GenreRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

#[async_trait]
impl GenreResolver for PostgresRepositories {
    async fn resolve_names(&self, names: &[String]) -> Result<Vec<i32>, RepoError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> =
            sqlx::query_scalar("SELECT id FROM genres WHERE name = ANY($1) ORDER BY id")
                .bind(names)
                .fetch_all(self.pool())
                .await
                .map_err(map_sqlx_error)?;

        Ok(ids)
    }

    async fn list_all(&self) -> Result<Vec<GenreRecord>, RepoError> {
        let rows = sqlx::query_as::<_, GenreRow>("SELECT id, name FROM genres ORDER BY name")
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(GenreRecord::from).collect())
    }
}
