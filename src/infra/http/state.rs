use std::sync::Arc;

use crate::application::movies::MovieService;
use crate::application::repos::GenreResolver;
use crate::application::reviews::ReviewService;
use crate::application::users::UserService;
use crate::application::watchlist::WatchlistService;

#[derive(Clone)]
pub struct HttpState {
    pub movies: Arc<MovieService>,
    pub reviews: Arc<ReviewService>,
    pub watchlist: Arc<WatchlistService>,
    pub users: Arc<UserService>,
    pub genres: Arc<dyn GenreResolver>,
    /// Accepted `x-api-key` values. Empty list disables the gate.
    pub api_keys: Arc<Vec<String>>,
    pub default_page_size: u32,
}
