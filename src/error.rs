//! Error taxonomy for the training pipeline and the backing store.
//!
//! Every failure in the library surfaces as one of four kinds. The command
//! line front end catches them once and turns them into a JSON payload plus
//! an exit code, mirroring the status codes the HTTP surface would use.

use serde_json::{json, Value};
use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while loading records, training or reading results.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The backing store could not be reached or read.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The record set has no target column. Raised before any cleaning.
    #[error("The required '{column}' column is missing from the dataset.")]
    MissingTargetColumn { column: String },

    /// Fitting or evaluating the model failed; carries the underlying cause.
    #[error("Training failed: {0}")]
    TrainingFailed(String),

    /// No model result exists with this identifier.
    #[error("Result '{id}' not found.")]
    NotFound { id: String },
}

impl PipelineError {
    pub fn storage(cause: impl std::fmt::Display) -> Self {
        PipelineError::StorageUnavailable(cause.to_string())
    }

    pub fn training(cause: impl std::fmt::Display) -> Self {
        PipelineError::TrainingFailed(cause.to_string())
    }

    /// HTTP-equivalent status for this kind of failure
    pub fn status_code(&self) -> u16 {
        match self {
            PipelineError::StorageUnavailable(_) => 500,
            PipelineError::MissingTargetColumn { .. } => 400,
            PipelineError::TrainingFailed(_) => 500,
            PipelineError::NotFound { .. } => 404,
        }
    }

    /// Process exit code used by the CLI
    pub fn exit_code(&self) -> i32 {
        match self.status_code() {
            400 => 2,
            404 => 3,
            _ => 1,
        }
    }

    /// Structured payload with a human-readable message
    pub fn to_payload(&self) -> Value {
        json!({ "error": self.to_string() })
    }
}
