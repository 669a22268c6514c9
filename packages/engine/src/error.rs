use std::path::PathBuf;

use thiserror::Error;

use crate::model::ModelError;
use crate::storage::StorageError;

/// Failures surfaced by [`crate::RecallEngine`] setup and administrative calls
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("item store error: {0}")]
    Storage(#[from] StorageError),

    #[error("model store error: {0}")]
    Model(#[from] ModelError),

    #[error("cannot create model directory {path}: {source}")]
    ModelDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type EngineResult<T> = Result<T, EngineError>;
