//! Incremental feature normalization
//!
//! Running per-feature mean/variance using Welford's update, so statistics stay
//! exact without ever revisiting earlier samples.

use serde::{Deserialize, Serialize};

use crate::sanitize::safe_scale;
use crate::types::FEATURE_DIMENSION;

/// Running mean/variance for each model feature
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunningStats {
    /// Samples folded in so far
    pub count: u64,
    /// Per-feature running mean
    pub mean: [f64; FEATURE_DIMENSION],
    /// Per-feature sum of squared deviations from the mean
    pub m2: [f64; FEATURE_DIMENSION],
}

impl Default for RunningStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunningStats {
    pub fn new() -> Self {
        Self {
            count: 0,
            mean: [0.0; FEATURE_DIMENSION],
            m2: [0.0; FEATURE_DIMENSION],
        }
    }

    /// Fold one sample into the statistics
    pub fn update(&mut self, x: &[f64; FEATURE_DIMENSION]) {
        self.count += 1;
        let n = self.count as f64;
        for i in 0..FEATURE_DIMENSION {
            let delta = x[i] - self.mean[i];
            self.mean[i] += delta / n;
            let delta2 = x[i] - self.mean[i];
            self.m2[i] += delta * delta2;
        }
    }

    /// Population variance per feature (0.0 before any sample)
    pub fn variance(&self) -> [f64; FEATURE_DIMENSION] {
        let mut var = [0.0; FEATURE_DIMENSION];
        if self.count > 0 {
            let n = self.count as f64;
            for (v, m2) in var.iter_mut().zip(self.m2.iter()) {
                *v = m2 / n;
            }
        }
        var
    }

    /// Divisor applied to each centred feature
    pub fn scales(&self) -> [f64; FEATURE_DIMENSION] {
        self.variance().map(safe_scale)
    }

    /// Centre and scale a sample with the current statistics
    pub fn transform(&self, x: &[f64; FEATURE_DIMENSION]) -> [f64; FEATURE_DIMENSION] {
        let scales = self.scales();
        let mut out = [0.0; FEATURE_DIMENSION];
        for i in 0..FEATURE_DIMENSION {
            out[i] = (x[i] - self.mean[i]) / scales[i];
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Statistics loaded from storage must be finite with non-negative spread
    pub fn is_valid(&self) -> bool {
        self.mean.iter().all(|v| v.is_finite()) && self.m2.iter().all(|v| v.is_finite() && *v >= 0.0)
    }
}
