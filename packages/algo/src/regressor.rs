//! Online linear regressor
//!
//! Squared-loss linear model trained one sample at a time by stochastic gradient
//! descent with an L2 penalty on the weights and an inverse-scaling learning rate.

use serde::{Deserialize, Serialize};

use crate::sanitize::diagnose_parameters;
use crate::types::{RecallModelConfig, FEATURE_DIMENSION};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressor {
    pub weights: [f64; FEATURE_DIMENSION],
    pub intercept: f64,
    /// Step counter driving the learning-rate schedule, starts at 1
    pub t: f64,
}

impl LinearRegressor {
    /// Fresh parameters: zero weights, intercept at `initial_intercept`
    pub fn new(initial_intercept: f64) -> Self {
        Self {
            weights: [0.0; FEATURE_DIMENSION],
            intercept: initial_intercept,
            t: 1.0,
        }
    }

    /// Unclipped output for an already-normalized sample
    pub fn predict_raw(&self, x: &[f64; FEATURE_DIMENSION]) -> f64 {
        self.weights
            .iter()
            .zip(x.iter())
            .map(|(w, xi)| w * xi)
            .sum::<f64>()
            + self.intercept
    }

    /// Learning rate for the next step
    pub fn learning_rate(&self, config: &RecallModelConfig) -> f64 {
        config.eta0 / self.t.powf(config.power_t)
    }

    /// One gradient step toward `target` on a normalized sample.
    ///
    /// The error is taken on the output clipped to `[0, 1]`, so an output already
    /// past the target's bound gets no gradient. Weight decay is offset in the
    /// intercept at `x`, leaving the output there to the error term alone.
    pub fn step(&mut self, x: &[f64; FEATURE_DIMENSION], target: f64, config: &RecallModelConfig) {
        let eta = self.learning_rate(config);
        let error = self.predict_raw(x).clamp(0.0, 1.0) - target;

        let mut decay_at_x = 0.0;
        for (w, xi) in self.weights.iter_mut().zip(x.iter()) {
            let decay = eta * config.alpha * *w;
            decay_at_x += decay * xi;
            *w -= eta * error * xi + decay;
        }
        self.intercept += decay_at_x - eta * error;
        self.t += 1.0;
    }

    /// Re-express the parameters for new normalization constants.
    ///
    /// With `z = (x - centre) / scale`, the output for every raw `x` is the same
    /// before and after the call.
    pub fn rebase(
        &mut self,
        old_centre: &[f64; FEATURE_DIMENSION],
        old_scale: &[f64; FEATURE_DIMENSION],
        new_centre: &[f64; FEATURE_DIMENSION],
        new_scale: &[f64; FEATURE_DIMENSION],
    ) {
        for i in 0..FEATURE_DIMENSION {
            let w = self.weights[i];
            self.intercept += w * (new_centre[i] - old_centre[i]) / old_scale[i];
            self.weights[i] = w * new_scale[i] / old_scale[i];
        }
    }

    pub fn is_valid(&self) -> bool {
        let mut params = self.weights.to_vec();
        params.push(self.intercept);
        diagnose_parameters(&params).is_healthy() && self.t.is_finite() && self.t >= 1.0
    }
}
