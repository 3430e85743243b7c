//! Shared fixtures: an in-memory persistence fake and a router builder.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use time::OffsetDateTime;
use uuid::Uuid;

use marquee::application::filters::CompiledQuery;
use marquee::application::movies::MovieService;
use marquee::application::repos::{
    GenreResolver, MoviesRepo, NewMovieParams, NewReviewParams, NewSessionParams, NewUserParams,
    RatingDelta, RepoError, ReviewsRepo, UpdateMovieParams, UsersRepo, WatchlistRepo,
};
use marquee::application::reviews::ReviewService;
use marquee::application::users::UserService;
use marquee::application::watchlist::WatchlistService;
use marquee::cache::{CacheState, CacheStore, MemoryStore, ResponseCache, TtlPolicy};
use marquee::domain::genres::GenreRecord;
use marquee::domain::movies::MovieRecord;
use marquee::domain::reviews::{ReviewRecord, ReviewWithAuthor};
use marquee::domain::users::{SessionRecord, UserRecord};
use marquee::domain::watchlist::WatchlistEntryRecord;
use marquee::infra::http::{self, HttpState};

/// In-memory stand-in for the Postgres repositories. Tracks how many times
/// the movie listing query ran so cache tests can observe handler execution.
#[derive(Default)]
pub struct MemStore {
    pub movies: Mutex<Vec<MovieRecord>>,
    pub genres: Mutex<Vec<GenreRecord>>,
    pub reviews: Mutex<Vec<ReviewRecord>>,
    pub users: Mutex<Vec<UserRecord>>,
    pub sessions: Mutex<HashMap<String, SessionRecord>>,
    pub watchlist: Mutex<Vec<WatchlistEntryRecord>>,
    pub find_calls: AtomicUsize,
}

impl MemStore {
    pub fn with_genres(genres: &[(i32, &str)]) -> Arc<Self> {
        let store = Self::default();
        *store.genres.lock().unwrap() = genres
            .iter()
            .map(|(id, name)| GenreRecord {
                id: *id,
                name: name.to_string(),
            })
            .collect();
        Arc::new(store)
    }

    pub fn seed_movie(&self, title: &str, genre_ids: Vec<i32>) -> Uuid {
        let id = Uuid::new_v4();
        self.movies.lock().unwrap().push(MovieRecord {
            id,
            title: title.to_string(),
            overview: String::new(),
            genre_ids,
            average_rating: 0.0,
            rate_count: 0,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        });
        id
    }

    pub fn movie(&self, id: Uuid) -> Option<MovieRecord> {
        self.movies.lock().unwrap().iter().find(|m| m.id == id).cloned()
    }
}

#[async_trait]
impl MoviesRepo for MemStore {
    async fn create(&self, params: NewMovieParams) -> Result<MovieRecord, RepoError> {
        let record = MovieRecord {
            id: Uuid::new_v4(),
            title: params.title,
            overview: params.overview,
            genre_ids: params.genre_ids,
            average_rating: 0.0,
            rate_count: 0,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        };
        self.movies.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn find(
        &self,
        query: &CompiledQuery,
        skip: u64,
        limit: u32,
    ) -> Result<Vec<MovieRecord>, RepoError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        let movies = self.movies.lock().unwrap();
        Ok(movies
            .iter()
            .filter(|m| query.matches(m))
            .skip(skip as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self, query: &CompiledQuery) -> Result<u64, RepoError> {
        let movies = self.movies.lock().unwrap();
        Ok(movies.iter().filter(|m| query.matches(m)).count() as u64)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<MovieRecord>, RepoError> {
        Ok(self.movie(id))
    }

    async fn update(
        &self,
        id: Uuid,
        params: UpdateMovieParams,
    ) -> Result<Option<MovieRecord>, RepoError> {
        let mut movies = self.movies.lock().unwrap();
        Ok(movies.iter_mut().find(|m| m.id == id).map(|movie| {
            if let Some(title) = params.title {
                movie.title = title;
            }
            if let Some(overview) = params.overview {
                movie.overview = overview;
            }
            if let Some(genre_ids) = params.genre_ids {
                movie.genre_ids = genre_ids;
            }
            movie.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let mut movies = self.movies.lock().unwrap();
        let before = movies.len();
        movies.retain(|m| m.id != id);
        Ok(movies.len() < before)
    }

    async fn apply_rating_delta(&self, id: Uuid, delta: RatingDelta) -> Result<(), RepoError> {
        let mut movies = self.movies.lock().unwrap();
        let movie = movies
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(RepoError::NotFound)?;
        movie.rate_count += delta.rate_count;
        movie.average_rating += delta.average_rating;
        Ok(())
    }
}

#[async_trait]
impl GenreResolver for MemStore {
    async fn resolve_names(&self, names: &[String]) -> Result<Vec<i32>, RepoError> {
        let genres = self.genres.lock().unwrap();
        Ok(genres
            .iter()
            .filter(|g| names.contains(&g.name))
            .map(|g| g.id)
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<GenreRecord>, RepoError> {
        Ok(self.genres.lock().unwrap().clone())
    }
}

#[async_trait]
impl ReviewsRepo for MemStore {
    async fn create(&self, params: NewReviewParams) -> Result<ReviewRecord, RepoError> {
        let mut reviews = self.reviews.lock().unwrap();
        if reviews
            .iter()
            .any(|r| r.user_id == params.user_id && r.movie_id == params.movie_id)
        {
            return Err(RepoError::Duplicate {
                constraint: "reviews_user_movie_key".to_string(),
            });
        }
        let record = ReviewRecord {
            id: Uuid::new_v4(),
            user_id: params.user_id,
            movie_id: params.movie_id,
            rating: params.rating,
            review_text: params.review_text,
            created_at: OffsetDateTime::now_utc(),
        };
        reviews.push(record.clone());
        Ok(record)
    }

    async fn find_by_user_and_movie(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
    ) -> Result<Option<ReviewRecord>, RepoError> {
        Ok(self
            .reviews
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.user_id == user_id && r.movie_id == movie_id)
            .cloned())
    }

    async fn list_for_movie(&self, movie_id: Uuid) -> Result<Vec<ReviewWithAuthor>, RepoError> {
        let reviews = self.reviews.lock().unwrap();
        let users = self.users.lock().unwrap();
        Ok(reviews
            .iter()
            .filter(|r| r.movie_id == movie_id)
            .map(|r| ReviewWithAuthor {
                review: r.clone(),
                username: users
                    .iter()
                    .find(|u| u.id == r.user_id)
                    .map(|u| u.username.clone())
                    .unwrap_or_default(),
            })
            .collect())
    }
}

#[async_trait]
impl WatchlistRepo for MemStore {
    async fn add(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
    ) -> Result<WatchlistEntryRecord, RepoError> {
        let mut entries = self.watchlist.lock().unwrap();
        if entries
            .iter()
            .any(|e| e.user_id == user_id && e.movie_id == movie_id)
        {
            return Err(RepoError::Duplicate {
                constraint: "watchlist_user_movie_key".to_string(),
            });
        }
        let record = WatchlistEntryRecord {
            id: Uuid::new_v4(),
            user_id,
            movie_id,
            created_at: OffsetDateTime::now_utc(),
        };
        entries.push(record.clone());
        Ok(record)
    }

    async fn find_entry(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
    ) -> Result<Option<WatchlistEntryRecord>, RepoError> {
        Ok(self
            .watchlist
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.user_id == user_id && e.movie_id == movie_id)
            .cloned())
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<(WatchlistEntryRecord, MovieRecord)>, RepoError> {
        let entries = self.watchlist.lock().unwrap();
        let movies = self.movies.lock().unwrap();
        Ok(entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .filter_map(|e| {
                movies
                    .iter()
                    .find(|m| m.id == e.movie_id)
                    .map(|m| (e.clone(), m.clone()))
            })
            .collect())
    }
}

#[async_trait]
impl UsersRepo for MemStore {
    async fn create(&self, params: NewUserParams) -> Result<UserRecord, RepoError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.username == params.username) {
            return Err(RepoError::Duplicate {
                constraint: "users_username_key".to_string(),
            });
        }
        let record = UserRecord {
            id: Uuid::new_v4(),
            name: params.name,
            username: params.username,
            password_digest: params.password_digest,
            password_salt: params.password_salt,
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(record.clone());
        Ok(record)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn create_session(
        &self,
        params: NewSessionParams,
    ) -> Result<SessionRecord, RepoError> {
        let record = SessionRecord {
            id: Uuid::new_v4(),
            user_id: params.user_id,
            prefix: params.prefix.clone(),
            hashed_secret: params.hashed_secret,
            expires_at: params.expires_at,
            created_at: OffsetDateTime::now_utc(),
        };
        self.sessions
            .lock()
            .unwrap()
            .insert(params.prefix, record.clone());
        Ok(record)
    }

    async fn find_session_by_prefix(
        &self,
        prefix: &str,
    ) -> Result<Option<SessionRecord>, RepoError> {
        Ok(self.sessions.lock().unwrap().get(prefix).cloned())
    }
}

pub struct AppOptions {
    pub api_keys: Vec<String>,
    pub cache_enabled: bool,
    pub cache_routes: Vec<String>,
    pub default_ttl: Duration,
    pub cache_store: Option<Arc<dyn CacheStore>>,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            cache_enabled: false,
            cache_routes: vec!["/movies".to_string(), "/genres".to_string()],
            default_ttl: Duration::from_secs(30),
            cache_store: None,
        }
    }
}

pub fn build_app(store: Arc<MemStore>, options: AppOptions) -> Router {
    let movies = Arc::new(MovieService::new(store.clone(), store.clone()));
    let reviews = Arc::new(ReviewService::new(store.clone(), movies.clone()));
    let watchlist = Arc::new(WatchlistService::new(store.clone(), movies.clone()));
    let users = Arc::new(UserService::new(store.clone(), time::Duration::hours(1)));

    let state = HttpState {
        movies,
        reviews,
        watchlist,
        users,
        genres: store.clone(),
        api_keys: Arc::new(options.api_keys),
        default_page_size: 10,
    };

    let cache_store = options
        .cache_store
        .unwrap_or_else(|| Arc::new(MemoryStore::new(64)));
    let policy = TtlPolicy::new(options.default_ttl, HashMap::new());
    let cache_state = CacheState::new(
        options.cache_enabled,
        options.cache_routes,
        ResponseCache::new(cache_store, policy),
    );

    http::build_router(state, cache_state)
}
