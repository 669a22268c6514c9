//! Answer labelling
//!
//! Maps an answer event to the scalar used both as the model's training target
//! and as the item's new recall score.

use serde::{Deserialize, Serialize};

use crate::types::SLOW_RECALL_SECONDS;

pub const LABEL_INCORRECT: f64 = 0.0;
pub const LABEL_EFFORTFUL: f64 = 0.7;
pub const LABEL_FLUENT: f64 = 1.0;

/// Training target for one answer.
///
/// Incorrect answers score 0.0. Correct answers score 1.0 when given within
/// [`SLOW_RECALL_SECONDS`] and 0.7 otherwise; a non-finite time counts as slow.
pub fn label(is_correct: bool, response_time_seconds: f64) -> f64 {
    if !is_correct {
        LABEL_INCORRECT
    } else if response_time_seconds.is_finite() && response_time_seconds <= SLOW_RECALL_SECONDS {
        LABEL_FLUENT
    } else {
        LABEL_EFFORTFUL
    }
}

/// Coarse reading of a recall score for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MasteryBand {
    Critical,
    Weak,
    Good,
    Mastered,
}

impl MasteryBand {
    pub const MASTERED_THRESHOLD: f64 = 0.9;

    pub fn from_score(score: f64) -> Self {
        if score < 0.3 {
            Self::Critical
        } else if score < 0.6 {
            Self::Weak
        } else if score < Self::MASTERED_THRESHOLD {
            Self::Good
        } else {
            Self::Mastered
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Weak => "weak",
            Self::Good => "good",
            Self::Mastered => "mastered",
        }
    }
}
