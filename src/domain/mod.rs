pub mod error;
pub mod genres;
pub mod movies;
pub mod reviews;
pub mod users;
pub mod watchlist;
