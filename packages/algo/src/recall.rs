//! Recall probability estimator
//!
//! Pairs [`RunningStats`] normalization with a [`LinearRegressor`]. This is the
//! in-memory half of the recall model; persistence lives with the caller.

use crate::regressor::LinearRegressor;
use crate::sanitize::{clamp_unit, sanitize_feature_vector};
use crate::scaler::RunningStats;
use crate::types::{FeatureVector, ModelPhase, RecallModelConfig, FEATURE_DIMENSION};

#[derive(Debug, Clone, PartialEq)]
pub struct RecallEstimator {
    config: RecallModelConfig,
    stats: RunningStats,
    regressor: LinearRegressor,
}

impl Default for RecallEstimator {
    fn default() -> Self {
        Self::new(RecallModelConfig::default())
    }
}

impl RecallEstimator {
    /// Cold estimator with fresh parameters
    pub fn new(config: RecallModelConfig) -> Self {
        let regressor = LinearRegressor::new(config.cold_prediction);
        Self {
            config,
            stats: RunningStats::new(),
            regressor,
        }
    }

    /// Rebuild from persisted parts; `None` if either part is unusable
    pub fn from_parts(
        config: RecallModelConfig,
        regressor: LinearRegressor,
        stats: RunningStats,
    ) -> Option<Self> {
        if !regressor.is_valid() || !stats.is_valid() {
            return None;
        }
        Some(Self {
            config,
            stats,
            regressor,
        })
    }

    pub fn phase(&self) -> ModelPhase {
        if self.stats.is_empty() {
            ModelPhase::Cold
        } else {
            ModelPhase::Warm
        }
    }

    pub fn samples_seen(&self) -> u64 {
        self.stats.count
    }

    pub fn config(&self) -> &RecallModelConfig {
        &self.config
    }

    pub fn stats(&self) -> &RunningStats {
        &self.stats
    }

    pub fn regressor(&self) -> &LinearRegressor {
        &self.regressor
    }

    /// Recall probability in `[0, 1]`; the cold prediction until first trained
    pub fn predict(&self, features: &FeatureVector) -> f64 {
        if self.phase() == ModelPhase::Cold {
            return self.config.cold_prediction;
        }
        let x = self.stats.transform(&sanitized(features));
        clamp_unit(self.regressor.predict_raw(&x), self.config.cold_prediction)
    }

    /// Fold the sample into the statistics, then take one step toward `label`
    /// using the sample normalized with the updated statistics.
    ///
    /// The regressor is rebased onto the new statistics before the step, so
    /// only the step itself changes predictions: `predict(features)` never
    /// moves away from `label`.
    pub fn fit(&mut self, features: &FeatureVector, label: f64) {
        let raw = sanitized(features);
        let target = clamp_unit(label, self.config.cold_prediction);

        let (old_mean, old_scale) = (self.stats.mean, self.stats.scales());
        self.stats.update(&raw);
        self.regressor
            .rebase(&old_mean, &old_scale, &self.stats.mean, &self.stats.scales());

        let x = self.stats.transform(&raw);
        self.regressor.step(&x, target, &self.config);
    }
}

fn sanitized(features: &FeatureVector) -> [f64; FEATURE_DIMENSION] {
    let mut raw = features.to_array();
    sanitize_feature_vector(&mut raw);
    raw
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fv(count: f64, days: f64) -> FeatureVector {
        FeatureVector::new(count, days)
    }

    #[test]
    fn test_cold_predicts_half() {
        let est = RecallEstimator::default();
        assert_eq!(est.phase(), ModelPhase::Cold);
        assert_eq!(est.predict(&fv(0.0, 0.0)), 0.5);
        assert_eq!(est.predict(&fv(40.0, 300.0)), 0.5);
    }

    #[test]
    fn test_fit_warms_model() {
        let mut est = RecallEstimator::default();
        est.fit(&fv(1.0, 0.5), 1.0);
        assert_eq!(est.phase(), ModelPhase::Warm);
        assert_eq!(est.samples_seen(), 1);
    }

    #[test]
    fn test_first_fit_moves_from_cold_value() {
        let x = fv(2.0, 3.0);

        let mut up = RecallEstimator::default();
        let before = up.predict(&x);
        up.fit(&x, 1.0);
        assert!(up.predict(&x) >= before);

        let mut down = RecallEstimator::default();
        down.fit(&x, 0.0);
        assert!(down.predict(&x) <= before);
    }

    #[test]
    fn test_repeated_fit_is_monotone() {
        let x = fv(4.0, 1.25);
        let mut est = RecallEstimator::default();
        for _ in 0..50 {
            let before = est.predict(&x);
            est.fit(&x, 1.0);
            assert!(est.predict(&x) >= before);
        }
        for _ in 0..50 {
            let before = est.predict(&x);
            est.fit(&x, 0.0);
            assert!(est.predict(&x) <= before);
        }
    }

    #[test]
    fn test_new_sample_after_mixed_history_is_monotone() {
        let history = [
            (0.0, 0.0, 1.0),
            (1.0, 0.5, 0.7),
            (2.0, 30.0, 0.0),
            (6.0, 2.0, 1.0),
            (3.0, 90.0, 0.0),
            (1.0, 1.0, 1.0),
        ];
        let mut est = RecallEstimator::default();
        for (c, d, y) in history {
            est.fit(&fv(c, d), y);
        }

        // far outside the seen range, so the statistics shift a lot
        for x in [fv(150.0, 800.0), fv(0.0, 0.0), fv(40.0, 5.0)] {
            let before = est.predict(&x);
            let mut up = est.clone();
            up.fit(&x, 1.0);
            assert!(up.predict(&x) >= before - 1e-12);

            let mut down = est.clone();
            down.fit(&x, 0.0);
            assert!(down.predict(&x) <= before + 1e-12);
        }
    }

    #[test]
    fn test_invalid_label_is_clamped() {
        let mut est = RecallEstimator::default();
        est.fit(&fv(1.0, 1.0), 7.0);
        assert!(est.regressor().is_valid());
        est.fit(&fv(1.0, 1.0), f64::NAN);
        assert!(est.regressor().is_valid());
    }

    #[test]
    fn test_from_parts_rejects_corrupt_state() {
        let config = RecallModelConfig::default();
        let mut reg = LinearRegressor::new(0.5);
        reg.intercept = f64::NAN;
        assert!(RecallEstimator::from_parts(config.clone(), reg, RunningStats::new()).is_none());

        let est = RecallEstimator::from_parts(config, LinearRegressor::new(0.5), RunningStats::new());
        assert!(est.is_some());
    }

    #[test]
    fn test_json_parts_reproduce_predictions() {
        let mut est = RecallEstimator::default();
        for (c, d, y) in [(0.0, 0.0, 1.0), (1.0, 0.3, 0.7), (2.0, 9.1, 0.0), (5.0, 2.2, 1.0)] {
            est.fit(&fv(c, d), y);
        }
        let reg: LinearRegressor = serde_json::from_str(&serde_json::to_string(est.regressor()).unwrap()).unwrap();
        let stats: RunningStats = serde_json::from_str(&serde_json::to_string(est.stats()).unwrap()).unwrap();
        let restored = RecallEstimator::from_parts(est.config().clone(), reg, stats).unwrap();

        for x in [fv(0.0, 0.0), fv(3.0, 1.7), fv(12.0, 45.0)] {
            assert_eq!(restored.predict(&x), est.predict(&x));
        }
    }

    proptest! {
        #[test]
        fn predict_stays_in_unit_interval(
            history in prop::collection::vec((0u32..200, 0.0f64..1000.0, prop_oneof![Just(0.0), Just(0.7), Just(1.0)]), 0..40),
            count in -1e9f64..1e9,
            days in -1e9f64..1e9,
        ) {
            let mut est = RecallEstimator::default();
            for (c, d, label) in history {
                est.fit(&fv(c as f64, d), label);
            }
            let p = est.predict(&fv(count, days));
            prop_assert!((0.0..=1.0).contains(&p));
        }

        #[test]
        fn fit_never_moves_prediction_away_from_label(
            history in prop::collection::vec((0u32..200, 0.0f64..1000.0, prop_oneof![Just(0.0), Just(0.7), Just(1.0)]), 0..60),
            count in 0u32..200,
            days in 0.0f64..1000.0,
        ) {
            let mut est = RecallEstimator::default();
            for (c, d, label) in history {
                est.fit(&fv(c as f64, d), label);
            }
            let x = fv(count as f64, days);
            let before = est.predict(&x);

            let mut up = est.clone();
            up.fit(&x, 1.0);
            prop_assert!(up.predict(&x) >= before - 1e-9, "{} -> {}", before, up.predict(&x));

            let mut down = est;
            down.fit(&x, 0.0);
            prop_assert!(down.predict(&x) <= before + 1e-9, "{} -> {}", before, down.predict(&x));
        }

        #[test]
        fn cold_prediction_is_constant(count in any::<f64>(), days in any::<f64>()) {
            let est = RecallEstimator::default();
            prop_assert_eq!(est.predict(&fv(count, days)), 0.5);
        }
    }
}
