//! Error types for the batching pipeline.

use std::any::Any;
use std::fmt;
use thiserror::Error;

/// Error returned by a batch operation.
pub type OperationError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors reported by a pipeline.
///
/// Both kinds carry the exact items they implicate, in push order.
#[derive(Debug)]
pub enum PipelineError<T> {
    /// Items were pushed while the pipeline was cordoned.
    AdmissionRejected {
        /// The rejected items.
        items: Vec<T>,
    },
    /// The batch operation failed. The same items were restored to the front
    /// of the pending queue.
    BatchFailed {
        /// Items of the failed batch.
        items: Vec<T>,
        /// Error returned by the operation.
        source: OperationError,
    },
}

impl<T> PipelineError<T> {
    /// Items implicated by this error.
    pub fn items(&self) -> &[T] {
        match self {
            PipelineError::AdmissionRejected { items }
            | PipelineError::BatchFailed { items, .. } => items,
        }
    }

    /// Consumes the error, returning its items.
    pub fn into_items(self) -> Vec<T> {
        match self {
            PipelineError::AdmissionRejected { items }
            | PipelineError::BatchFailed { items, .. } => items,
        }
    }

    /// Returns `true` for admission rejections.
    pub fn is_rejection(&self) -> bool {
        matches!(self, PipelineError::AdmissionRejected { .. })
    }

    /// Returns `true` for failed batches.
    pub fn is_batch_failure(&self) -> bool {
        matches!(self, PipelineError::BatchFailed { .. })
    }
}

impl<T> fmt::Display for PipelineError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::AdmissionRejected { items } => {
                write!(f, "Rejected {} new items: pipeline is cordoned", items.len())
            }
            PipelineError::BatchFailed { items, source } => {
                write!(f, "Batch of {} items failed: {}", items.len(), source)
            }
        }
    }
}

impl<T: fmt::Debug> std::error::Error for PipelineError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::AdmissionRejected { .. } => None,
            PipelineError::BatchFailed { source, .. } => Some(&**source),
        }
    }
}

/// A batch operation panicked instead of returning an error.
#[derive(Debug, Clone, Error)]
#[error("Batch operation panicked: {message}")]
pub struct OperationPanicked {
    /// Panic message, when the payload was a string.
    pub message: String,
}

impl OperationPanicked {
    pub(crate) fn from_payload(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Self { message }
    }
}

/// Errors that can occur while loading configuration or building a pipeline.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found.
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    /// Failed to read configuration file.
    #[error("Failed to read configuration file: {0}")]
    Read(String),

    /// Failed to parse configuration file.
    #[error("Failed to parse configuration file: {0}")]
    Parse(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// The pipeline was built outside a Tokio runtime.
    #[error("No Tokio runtime available: {0}")]
    NoRuntime(String),
}
