//! User accounts and bearer-token sessions.
//!
//! Login issues an opaque token `mq_{prefix}_{secret}`. The prefix indexes
//! the session row; only the SHA-256 digest of the secret is stored, and
//! verification compares digests in constant time.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::application::repos::{NewSessionParams, NewUserParams, RepoError, UsersRepo};
use crate::domain::users::UserRecord;

const TOKEN_PREFIX: &str = "mq";

#[derive(Debug, Error)]
pub enum UserError {
    #[error("username already taken")]
    UsernameTaken,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    Missing,
    #[error("invalid bearer token")]
    Invalid,
    #[error("expired session")]
    Expired,
}

#[derive(Debug, Clone)]
pub struct RegisterCommand {
    pub name: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct SessionIssued {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

/// The authenticated caller, resolved from a bearer token and attached to
/// requests by the auth middleware.
#[derive(Debug, Clone)]
pub struct UserPrincipal {
    pub user_id: Uuid,
    pub username: String,
}

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UsersRepo>,
    session_ttl: Duration,
}

impl UserService {
    pub fn new(repo: Arc<dyn UsersRepo>, session_ttl: Duration) -> Self {
        Self { repo, session_ttl }
    }

    pub async fn register(&self, command: RegisterCommand) -> Result<UserRecord, UserError> {
        let username = command.username.trim().to_string();
        if username.is_empty() {
            return Err(UserError::InvalidInput("username must not be empty".into()));
        }
        if command.password.len() < 8 {
            return Err(UserError::InvalidInput(
                "password must be at least 8 characters".into(),
            ));
        }

        if self.repo.find_by_username(&username).await?.is_some() {
            return Err(UserError::UsernameTaken);
        }

        let salt = Uuid::new_v4().simple().to_string();
        let digest = Self::hash_password(&salt, &command.password);

        self.repo
            .create(NewUserParams {
                name: command.name.trim().to_string(),
                username,
                password_digest: digest,
                password_salt: salt,
            })
            .await
            .map_err(|err| match err {
                RepoError::Duplicate { .. } => UserError::UsernameTaken,
                other => UserError::Repo(other),
            })
    }

    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<SessionIssued, UserError> {
        let user = self
            .repo
            .find_by_username(username)
            .await?
            .ok_or(UserError::InvalidCredentials)?;

        let candidate = Self::hash_password(&user.password_salt, password);
        if !constant_time_eq(&candidate, &user.password_digest) {
            return Err(UserError::InvalidCredentials);
        }

        let prefix = Self::generate_fragment();
        let secret = Self::generate_fragment();
        let token = format!("{TOKEN_PREFIX}_{prefix}_{secret}");
        let expires_at = OffsetDateTime::now_utc() + self.session_ttl;

        self.repo
            .create_session(NewSessionParams {
                user_id: user.id,
                prefix,
                hashed_secret: Self::hash_secret(&secret),
                expires_at,
            })
            .await?;

        Ok(SessionIssued { token, expires_at })
    }

    pub async fn authenticate(&self, token: &str) -> Result<UserPrincipal, AuthError> {
        let (prefix, secret) = Self::parse_token(token).ok_or(AuthError::Invalid)?;

        let session = self
            .repo
            .find_session_by_prefix(prefix)
            .await
            .map_err(|_| AuthError::Invalid)?
            .ok_or(AuthError::Invalid)?;

        if !constant_time_eq(&Self::hash_secret(secret), &session.hashed_secret) {
            return Err(AuthError::Invalid);
        }
        if session.expires_at <= OffsetDateTime::now_utc() {
            return Err(AuthError::Expired);
        }

        let user = self
            .repo
            .find_by_id(session.user_id)
            .await
            .map_err(|_| AuthError::Invalid)?
            .ok_or(AuthError::Invalid)?;

        Ok(UserPrincipal {
            user_id: user.id,
            username: user.username,
        })
    }

    fn parse_token(token: &str) -> Option<(&str, &str)> {
        let rest = token.strip_prefix(TOKEN_PREFIX)?.strip_prefix('_')?;
        let (prefix, secret) = rest.split_once('_')?;
        if prefix.is_empty() || secret.is_empty() {
            return None;
        }
        Some((prefix, secret))
    }

    fn generate_fragment() -> String {
        Uuid::new_v4().simple().to_string()
    }

    fn hash_password(salt: &str, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(b":");
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn hash_secret(secret: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(secret.as_bytes());
        hex::encode(hasher.finalize())
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
