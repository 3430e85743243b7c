pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;

pub use state::HttpState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::cache::{CacheState, response_cache_layer};
use middleware::{log_responses, require_api_key, require_user, set_request_context};

/// Assemble the full application router.
///
/// Layer order, outermost first: request context, response logging, the API
/// key gate, then the response cache. A cache hit still pays the API key
/// check, and error responses never reach the cache.
pub fn build_router(state: HttpState, cache_state: CacheState) -> Router {
    let authed = Router::new()
        .route("/reviews", post(handlers::create_review))
        .route(
            "/watchlist",
            post(handlers::add_to_watchlist).get(handlers::list_watchlist),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_user,
        ));

    let open = Router::new()
        .route(
            "/movies",
            get(handlers::list_movies).post(handlers::create_movie),
        )
        .route(
            "/movies/{id}",
            get(handlers::get_movie)
                .patch(handlers::update_movie)
                .delete(handlers::delete_movie),
        )
        .route("/movies/{id}/reviews", get(handlers::list_movie_reviews))
        .route("/genres", get(handlers::list_genres))
        .route("/users", post(handlers::register))
        .route("/users/login", post(handlers::login));

    Router::new()
        .merge(open)
        .merge(authed)
        .layer(axum_middleware::from_fn_with_state(
            cache_state,
            response_cache_layer,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ))
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
        .with_state(state)
}
