//! Review-history feature extraction
//!
//! Turns an item's `(review_count, last_reviewed_at)` pair, as it was when the
//! item was presented, into the model's [`FeatureVector`].

use chrono::{DateTime, Utc};

use crate::types::{FeatureVector, SECONDS_PER_DAY};

/// Build the feature vector for one item at instant `now`.
///
/// Never-reviewed items get `days_since_last_review = 0.0`: they are treated as
/// immediately due rather than maximally stale. A clock reading earlier than the
/// last review yields 0.0 instead of a negative gap.
pub fn extract_features(
    review_count: u32,
    last_reviewed_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> FeatureVector {
    let days_since = match last_reviewed_at {
        Some(last) => days_between(last, now),
        None => 0.0,
    };

    FeatureVector::new(review_count as f64, days_since)
}

/// Fractional days from `earlier` to `later`, floored at zero
pub fn days_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    let elapsed_ms = (later - earlier).num_milliseconds() as f64;
    (elapsed_ms / 1000.0 / SECONDS_PER_DAY).max(0.0)
}
