//! Common Types and Constants
//!
//! Shared data structures used across all algorithm modules.

use serde::{Deserialize, Serialize};

// ==================== Constants ====================

/// Number of features fed to the recall model
pub const FEATURE_DIMENSION: usize = 2;

/// Seconds per day, used to convert review gaps into days
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Prediction served while the model has never been trained
pub const COLD_PREDICTION: f64 = 0.5;

/// Answers slower than this (seconds) count as effortful recall
pub const SLOW_RECALL_SECONDS: f64 = 10.0;

/// Maximum feature absolute value
pub const MAX_FEATURE_ABS: f64 = 1e6;

/// Numerical stability epsilon
pub const EPSILON: f64 = 1e-10;

// ==================== Feature Types ====================

/// Model input derived from an item's review history
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Number of completed reviews
    pub review_count: f64,
    /// Days elapsed since the previous review (0.0 for never-reviewed items)
    pub days_since_last_review: f64,
}

impl FeatureVector {
    pub fn new(review_count: f64, days_since_last_review: f64) -> Self {
        Self {
            review_count,
            days_since_last_review,
        }
    }

    pub fn to_array(&self) -> [f64; FEATURE_DIMENSION] {
        [self.review_count, self.days_since_last_review]
    }
}

// ==================== Model Types ====================

/// Hyper-parameters of the online recall regressor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecallModelConfig {
    /// Initial learning rate
    pub eta0: f64,
    /// Exponent of the inverse-scaling schedule `eta0 / t^power_t`
    pub power_t: f64,
    /// L2 penalty applied to the weights
    pub alpha: f64,
    /// Prediction served in the cold state, also the fresh intercept
    pub cold_prediction: f64,
}

impl Default for RecallModelConfig {
    fn default() -> Self {
        Self {
            eta0: 0.01,
            power_t: 0.25,
            alpha: 0.0001,
            cold_prediction: COLD_PREDICTION,
        }
    }
}

/// Lifecycle of the recall model
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelPhase {
    /// Never trained; predictions use the cold fallback
    Cold,
    /// At least one training step has been applied
    Warm,
}

// ==================== Session Types ====================

/// Per-tier quotas for one session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierQuota {
    /// Requested session size
    pub total: usize,
    /// Weakest reviewed items, `ceil(0.5 * total)`
    pub weak: usize,
    /// Random never-reviewed items, `floor(0.2 * total)`
    pub new: usize,
}

/// Which tier contributed an item to a session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionTier {
    Weak,
    New,
    ReviewedBackfill,
    NewBackfill,
}
