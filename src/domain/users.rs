use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub password_digest: String,
    pub password_salt: String,
    pub created_at: OffsetDateTime,
}

/// A login session. Only the SHA-256 digest of the token secret is stored;
/// the bearer token itself is shown to the client once at login.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub prefix: String,
    pub hashed_secret: String,
    pub expires_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
}
