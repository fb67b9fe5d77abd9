//! Sluice Core - bounded, self-draining batching pipeline.
//!
//! Callers push individual items; the pipeline accumulates them and, once the
//! configured batch size is reached, hands an ordered batch to a caller-supplied
//! async operation. At most one batch is in flight at a time. Failed batches are
//! returned to the front of the queue and retried on the next dispatch
//! opportunity, and errors are either delivered to a callback or accumulated
//! until [`Pipeline::flush`] surfaces them.
//!
//! # Example
//!
//! ```rust,no_run
//! use sluice_core::{OperationError, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = Pipeline::builder(|batch: Vec<u32>| async move {
//!         println!("writing {} rows", batch.len());
//!         Ok::<(), OperationError>(())
//!     })
//!     .batch_size(3)
//!     .build()?;
//!
//!     pipeline.push(1).push(2).push_all([3, 4, 5]);
//!     pipeline.flush().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod operation;
pub mod pipeline;
pub mod reporting;

pub use config::{BATCH_SIZE_ENV, DEFAULT_BATCH_SIZE, PipelineConfig};
pub use error::{ConfigError, OperationError, OperationPanicked, PipelineError};
pub use metrics::PipelineMetrics;
pub use operation::BatchOperation;
pub use pipeline::{Pipeline, PipelineBuilder};
pub use reporting::ErrorCallback;
