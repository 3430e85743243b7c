use std::{process, sync::Arc, time::Duration};

use marquee::{
    application::error::AppError,
    application::{
        movies::MovieService,
        repos::{GenreResolver, MoviesRepo, ReviewsRepo, UsersRepo, WatchlistRepo},
        reviews::ReviewService,
        users::UserService,
        watchlist::WatchlistService,
    },
    cache::{CacheState, MemoryStore, ResponseCache, TtlPolicy},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HttpState},
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (_cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    let repositories = init_repositories(&settings).await?;
    let (http_state, cache_state) = build_application_context(repositories, &settings);

    serve_http(&settings, http_state, cache_state).await
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.0)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_application_context(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> (HttpState, CacheState) {
    let movies_repo: Arc<dyn MoviesRepo> = repositories.clone();
    let genres_repo: Arc<dyn GenreResolver> = repositories.clone();
    let reviews_repo: Arc<dyn ReviewsRepo> = repositories.clone();
    let watchlist_repo: Arc<dyn WatchlistRepo> = repositories.clone();
    let users_repo: Arc<dyn UsersRepo> = repositories.clone();

    let movie_service = Arc::new(MovieService::new(movies_repo, genres_repo.clone()));
    let review_service = Arc::new(ReviewService::new(reviews_repo, movie_service.clone()));
    let watchlist_service = Arc::new(WatchlistService::new(
        watchlist_repo,
        movie_service.clone(),
    ));
    let user_service = Arc::new(UserService::new(
        users_repo,
        time::Duration::hours(settings.auth.session_ttl_hours as i64),
    ));

    let store = Arc::new(MemoryStore::new(settings.cache.capacity));
    let policy = TtlPolicy::from(&settings.cache);
    let cache_state = CacheState::new(
        settings.cache.enabled,
        settings.cache.routes.iter().cloned(),
        ResponseCache::new(store, policy),
    );

    let http_state = HttpState {
        movies: movie_service,
        reviews: review_service,
        watchlist: watchlist_service,
        users: user_service,
        genres: genres_repo,
        api_keys: Arc::new(settings.auth.api_keys.clone()),
        default_page_size: settings.auth.default_page_size,
    };

    (http_state, cache_state)
}

async fn serve_http(
    settings: &config::Settings,
    http_state: HttpState,
    cache_state: CacheState,
) -> Result<(), AppError> {
    let router = http::build_router(http_state, cache_state);

    let addr = settings
        .server
        .addr()
        .map_err(|err| AppError::unexpected(err.to_string()))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(target = "marquee::server", %addr, "listening");

    let grace = Duration::from_secs(settings.server.graceful_shutdown_seconds);
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal(grace))
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal(grace: Duration) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to install shutdown signal handler");
        return;
    }
    info!(
        target = "marquee::server",
        grace_seconds = grace.as_secs(),
        "shutdown signal received, draining connections"
    );
}
