//! Recall model with durable state
//!
//! Wraps the in-memory [`RecallEstimator`] with load/save of its two blobs:
//! regression parameters and normalization statistics. Loading never fails;
//! anything unusable on disk yields a fresh cold model.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use viva_algo::{FeatureVector, LinearRegressor, ModelPhase, RecallEstimator, RecallModelConfig, RunningStats};

use crate::storage::ModelBlobStore;

/// Blob holding the regression parameters
pub const PARAMS_BLOB: &str = "memory_model";
/// Blob holding the normalization statistics
pub const STATS_BLOB: &str = "scaler";

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("model blob {blob} I/O failed: {source}")]
    Io {
        blob: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("model blob {blob} could not be encoded: {source}")]
    Serialization {
        blob: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub type ModelResult<T> = Result<T, ModelError>;

/// Why a load fell back to a cold model
enum LoadFallback {
    Missing,
    Partial(&'static str),
    Unreadable(ModelError),
    Invalid,
}

pub struct RecallModel {
    estimator: RecallEstimator,
    store: Box<dyn ModelBlobStore>,
}

impl RecallModel {
    /// Restore the model from `store`, or start cold if nothing usable is there
    pub fn load<S: ModelBlobStore + 'static>(store: S, config: RecallModelConfig) -> Self {
        let store: Box<dyn ModelBlobStore> = Box::new(store);

        let estimator = match Self::read_state(store.as_ref(), &config) {
            Ok(estimator) => {
                tracing::info!(samples = estimator.samples_seen(), "loaded existing recall model");
                return Self { estimator, store };
            }
            Err(LoadFallback::Missing) => {
                tracing::info!("no existing recall model, starting cold");
                RecallEstimator::new(config)
            }
            Err(LoadFallback::Partial(missing)) => {
                tracing::warn!(missing, "recall model state incomplete, starting cold");
                RecallEstimator::new(config)
            }
            Err(LoadFallback::Unreadable(e)) => {
                tracing::warn!(error = %e, "recall model state unreadable, starting cold");
                RecallEstimator::new(config)
            }
            Err(LoadFallback::Invalid) => {
                tracing::warn!("recall model state failed validation, starting cold");
                RecallEstimator::new(config)
            }
        };

        Self { estimator, store }
    }

    fn read_state(store: &dyn ModelBlobStore, config: &RecallModelConfig) -> Result<RecallEstimator, LoadFallback> {
        let params = read_blob::<LinearRegressor>(store, PARAMS_BLOB).map_err(LoadFallback::Unreadable)?;
        let stats = read_blob::<RunningStats>(store, STATS_BLOB).map_err(LoadFallback::Unreadable)?;

        match (params, stats) {
            (Some(params), Some(stats)) => {
                RecallEstimator::from_parts(config.clone(), params, stats).ok_or(LoadFallback::Invalid)
            }
            (None, None) => Err(LoadFallback::Missing),
            (None, Some(_)) => Err(LoadFallback::Partial(PARAMS_BLOB)),
            (Some(_), None) => Err(LoadFallback::Partial(STATS_BLOB)),
        }
    }

    pub fn phase(&self) -> ModelPhase {
        self.estimator.phase()
    }

    pub fn is_warm(&self) -> bool {
        self.phase() == ModelPhase::Warm
    }

    pub fn samples_seen(&self) -> u64 {
        self.estimator.samples_seen()
    }

    /// Current normalization statistics
    pub fn stats(&self) -> &RunningStats {
        self.estimator.stats()
    }

    /// Recall probability in `[0, 1]`; 0.5 while cold
    pub fn predict(&self, features: &FeatureVector) -> f64 {
        self.estimator.predict(features)
    }

    /// One incremental training step, then persist.
    ///
    /// The in-memory update always happens; an `Err` only means the new state
    /// did not reach durable storage.
    pub fn train(&mut self, features: &FeatureVector, label: f64) -> ModelResult<()> {
        self.estimator.fit(features, label);
        self.save()
    }

    /// Write both blobs
    pub fn save(&self) -> ModelResult<()> {
        write_blob(self.store.as_ref(), PARAMS_BLOB, self.estimator.regressor())?;
        write_blob(self.store.as_ref(), STATS_BLOB, self.estimator.stats())?;
        Ok(())
    }

    /// Drop all learned state and delete both blobs
    pub fn reset(&mut self) -> ModelResult<()> {
        self.estimator = RecallEstimator::new(self.estimator.config().clone());
        for blob in [PARAMS_BLOB, STATS_BLOB] {
            self.store
                .remove(blob)
                .map_err(|source| ModelError::Io { blob, source })?;
        }
        tracing::info!("recall model reset to cold");
        Ok(())
    }
}

fn read_blob<T: DeserializeOwned>(store: &dyn ModelBlobStore, blob: &'static str) -> ModelResult<Option<T>> {
    let Some(bytes) = store.read(blob).map_err(|source| ModelError::Io { blob, source })? else {
        return Ok(None);
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| ModelError::Serialization { blob, source })
}

fn write_blob<T: Serialize>(store: &dyn ModelBlobStore, blob: &'static str, value: &T) -> ModelResult<()> {
    let bytes = serde_json::to_vec(value).map_err(|source| ModelError::Serialization { blob, source })?;
    store
        .write(blob, &bytes)
        .map_err(|source| ModelError::Io { blob, source })
}
