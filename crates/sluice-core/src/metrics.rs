//! Pipeline metrics.

use serde::{Deserialize, Serialize};

/// Point-in-time snapshot of a pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineMetrics {
    /// Items waiting for a batch.
    pub pending: usize,
    /// Number of batches executing (0 or 1).
    pub in_flight: usize,
    /// Items in the executing batch.
    pub in_flight_items: usize,
    /// Errors waiting to be surfaced by `flush`.
    pub unreported_errors: usize,
    /// Batches handed to the operation, retries included.
    pub batches_dispatched: u64,
    /// Batches the operation accepted.
    pub batches_succeeded: u64,
    /// Batches the operation failed.
    pub batches_failed: u64,
    /// Items that were part of a successful batch.
    pub items_processed: u64,
    /// Items rejected while cordoned.
    pub items_rejected: u64,
    /// Whether admission is currently blocked.
    pub cordoned: bool,
}

impl PipelineMetrics {
    /// Returns `true` when nothing is pending, executing, or unreported.
    pub fn is_flushed(&self) -> bool {
        self.pending == 0 && self.in_flight == 0 && self.unreported_errors == 0
    }
}

/// Running totals kept with the pipeline state.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Counters {
    pub batches_dispatched: u64,
    pub batches_succeeded: u64,
    pub batches_failed: u64,
    pub items_processed: u64,
    pub items_rejected: u64,
}
