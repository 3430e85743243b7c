use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct WatchlistEntryRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub movie_id: Uuid,
    pub created_at: OffsetDateTime,
}
