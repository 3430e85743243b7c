//! Movie catalog service with a read-through response cache, online rating
//! aggregation, and a declarative filter compiler.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
