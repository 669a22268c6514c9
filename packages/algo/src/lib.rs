//! # viva-algo - MCQ revision core algorithms
//!
//! Pure Rust algorithms behind the revision scheduler:
//!
//! - **Features** - review history to model inputs
//! - **Running statistics** - Welford incremental normalization
//! - **Online regressor** - squared-loss SGD with inverse-scaling learning rate
//! - **Labelling** - answer events to training targets
//! - **Tiered sampling** - weakest-first / random-new / backfill session assembly
//!
//! No I/O happens here: persistence and the item store belong to `viva-engine`.
//!
//! ## Modules
//!
//! - [`features`] - feature extraction from `(review_count, last_reviewed_at)`
//! - [`scaler`] - running mean/variance per feature
//! - [`regressor`] - online linear regressor
//! - [`recall`] - normalization + regressor, cold-start fallback
//! - [`label`] - answer labelling and mastery bands
//! - [`tiering`] - session quotas and deduplicating assembler
//! - [`sanitize`] - numerical stability helpers
//! - [`types`] - shared types and constants
//!
//! ## Example
//!
//! ```rust
//! use viva_algo::{label, FeatureVector, RecallEstimator};
//!
//! let mut estimator = RecallEstimator::default();
//! let features = FeatureVector::new(1.0, 2.5);
//! assert_eq!(estimator.predict(&features), 0.5);
//!
//! estimator.fit(&features, label(true, 4.0));
//! assert!(estimator.predict(&features) >= 0.5);
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod features;
pub mod label;
pub mod recall;
pub mod regressor;
pub mod sanitize;
pub mod scaler;
pub mod tiering;
pub mod types;

// ============================================================================
// Re-exports
// ============================================================================

pub use types::*;

pub use features::{days_between, extract_features};
pub use label::{label, MasteryBand};
pub use recall::RecallEstimator;
pub use regressor::LinearRegressor;
pub use scaler::RunningStats;
pub use tiering::{quota, Keyed, SessionAssembler};
