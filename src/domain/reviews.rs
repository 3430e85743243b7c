use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct ReviewRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub movie_id: Uuid,
    pub rating: f64,
    pub review_text: String,
    pub created_at: OffsetDateTime,
}

/// A review joined with its author's username for listing endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewWithAuthor {
    pub review: ReviewRecord,
    pub username: String,
}
