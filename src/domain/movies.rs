//! Movie records and the rating aggregate.
//!
//! A movie carries a running rating aggregate `(average_rating, rate_count)`
//! that is always the exact arithmetic mean of every rating ever recorded,
//! even though individual samples are never retained. The aggregate is only
//! ever advanced through [`rating_delta`] followed by a single atomic
//! two-column increment in the backing store.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use super::error::DomainError;

/// Lowest rating a review may carry.
pub const MIN_RATING: f64 = 1.0;
/// Highest rating a review may carry.
pub const MAX_RATING: f64 = 10.0;

#[derive(Debug, Clone, Serialize)]
pub struct MovieRecord {
    pub id: Uuid,
    pub title: String,
    pub overview: String,
    pub genre_ids: Vec<i32>,
    pub average_rating: f64,
    pub rate_count: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Validate that a rating lies in the accepted `[1, 10]` range.
pub fn validate_rating(rating: f64) -> Result<(), DomainError> {
    if !rating.is_finite() || !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(DomainError::validation(format!(
            "rating must be between {MIN_RATING} and {MAX_RATING}, got {rating}"
        )));
    }
    Ok(())
}

/// Streaming-mean increment for one new sample.
///
/// Given the current aggregate and a new rating, returns the delta to add to
/// the stored average so that `average + delta` is the mean over
/// `rate_count + 1` samples: `(rating - average) / (count + 1)`.
pub fn rating_delta(average_rating: f64, rate_count: i64, new_rating: f64) -> f64 {
    (new_rating - average_rating) / (rate_count + 1) as f64
}
