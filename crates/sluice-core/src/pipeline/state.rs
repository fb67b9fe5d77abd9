//! Mutable pipeline state, guarded by a single mutex.

use crate::error::PipelineError;
use crate::metrics::{Counters, PipelineMetrics};
use futures::future::{BoxFuture, Shared};
use std::collections::VecDeque;
use tokio::task::AbortHandle;

/// Completion signal of the executing batch.
pub(crate) type Completion = Shared<BoxFuture<'static, ()>>;

/// The batch currently handed to the operation.
pub(crate) struct InFlight {
    /// Dispatch sequence number of the batch.
    pub sequence: u64,
    /// Number of items in the batch.
    pub items: usize,
    /// Resolves once the batch task has finished, success or failure.
    pub completion: Completion,
    /// Handle on the spawned batch task.
    pub task: AbortHandle,
}

impl InFlight {
    /// The task ended without clearing the slot, so it was cancelled.
    ///
    /// Only meaningful under the state lock: completion clears the slot before
    /// the task finishes.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.task.is_finished()
    }
}

pub(crate) struct PipelineState<T> {
    /// Items awaiting a batch, oldest first.
    pub pending: VecDeque<T>,
    /// At most one executing batch.
    pub in_flight: Option<InFlight>,
    /// Admission gate.
    pub cordoned: bool,
    /// Errors accumulated for `flush`. Always empty in callback mode.
    pub unreported: VecDeque<PipelineError<T>>,
    pub counters: Counters,
}

impl<T> PipelineState<T> {
    pub(crate) fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            in_flight: None,
            cordoned: false,
            unreported: VecDeque::new(),
            counters: Counters::default(),
        }
    }

    pub(crate) fn is_quiescent(&self) -> bool {
        self.pending.is_empty() && self.in_flight.is_none() && self.unreported.is_empty()
    }

    /// Puts a failed batch back in front of everything pushed since it left.
    pub(crate) fn restore_front(&mut self, batch: &[T])
    where
        T: Clone,
    {
        let mut restored: VecDeque<T> = batch.iter().cloned().collect();
        restored.append(&mut self.pending);
        self.pending = restored;
    }

    pub(crate) fn metrics(&self) -> PipelineMetrics {
        PipelineMetrics {
            pending: self.pending.len(),
            in_flight: usize::from(self.in_flight.is_some()),
            in_flight_items: self.in_flight.as_ref().map_or(0, |f| f.items),
            unreported_errors: self.unreported.len(),
            batches_dispatched: self.counters.batches_dispatched,
            batches_succeeded: self.counters.batches_succeeded,
            batches_failed: self.counters.batches_failed,
            items_processed: self.counters.items_processed,
            items_rejected: self.counters.items_rejected,
            cordoned: self.cordoned,
        }
    }
}
