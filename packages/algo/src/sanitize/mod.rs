//! Guards against non-finite numbers reaching the model or its persisted state

use crate::types::{EPSILON, MAX_FEATURE_ABS};

/// Whether any value is NaN or infinite
pub fn has_invalid_values(arr: &[f64]) -> bool {
    !arr.iter().all(|x| x.is_finite())
}

/// Replace invalid values with 0.0 and clamp the rest to `[-MAX_FEATURE_ABS, MAX_FEATURE_ABS]`
pub fn sanitize_feature_vector(x: &mut [f64]) {
    for val in x.iter_mut() {
        *val = if val.is_finite() {
            (*val).clamp(-MAX_FEATURE_ABS, MAX_FEATURE_ABS)
        } else {
            0.0
        };
    }
}

/// Clamp a value into `[0, 1]`; NaN maps to `fallback`
pub fn clamp_unit(value: f64, fallback: f64) -> f64 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Standard deviation to divide by; degenerate spreads use a unit scale
pub fn safe_scale(variance: f64) -> f64 {
    if !variance.is_finite() || variance <= EPSILON {
        1.0
    } else {
        variance.sqrt()
    }
}

/// Health report for persisted model parameters
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterDiagnostics {
    pub has_nan: bool,
    pub has_inf: bool,
    pub max_abs: f64,
}

impl ParameterDiagnostics {
    pub fn is_healthy(&self) -> bool {
        !self.has_nan && !self.has_inf
    }
}

/// Inspect a parameter vector for NaN/Inf and magnitude
pub fn diagnose_parameters(params: &[f64]) -> ParameterDiagnostics {
    let mut report = ParameterDiagnostics::default();
    for &val in params {
        if val.is_nan() {
            report.has_nan = true;
        } else if val.is_infinite() {
            report.has_inf = true;
        } else {
            report.max_abs = report.max_abs.max(val.abs());
        }
    }
    report
}
