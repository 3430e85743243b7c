pub mod error;
pub mod filters;
pub mod movies;
pub mod repos;
pub mod reviews;
pub mod users;
pub mod watchlist;
