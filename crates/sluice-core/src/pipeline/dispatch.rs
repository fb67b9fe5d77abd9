//! Batch dispatch and completion.
//!
//! The in-flight slot is the only gate on starting a batch: dispatch is a no-op
//! while it is occupied. Completion clears the slot, then either starts the next
//! batch (success) or restores the failed batch to the front of the queue and
//! reports the error (failure). Failures are never retried automatically.

use super::Inner;
use super::state::{InFlight, PipelineState};
use crate::error::{OperationError, OperationPanicked, PipelineError};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, warn};

impl<T> Inner<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Starts the next batch if nothing is executing and items are pending.
    ///
    /// The caller holds the state lock, so the spawned task cannot observe the
    /// slot before it is filled. A slot left behind by a cancelled task is
    /// released first.
    pub(super) fn dispatch_locked(self: &Arc<Self>, state: &mut PipelineState<T>) {
        if let Some(in_flight) = &state.in_flight {
            if !in_flight.is_cancelled() {
                return;
            }
            let sequence = in_flight.sequence;
            release_cancelled(state, sequence);
        }
        if state.pending.is_empty() {
            return;
        }

        let take = self.batch_size.min(state.pending.len());
        let batch: Vec<T> = state.pending.drain(..take).collect();
        state.counters.batches_dispatched += 1;
        let sequence = state.counters.batches_dispatched;
        debug!(sequence, items = take, pending = state.pending.len(), "Dispatching batch");

        let task = self.runtime.spawn(Arc::clone(self).run_batch(sequence, batch));
        let abort = task.abort_handle();
        let owner = Arc::downgrade(self);
        let completion = async move {
            if let Err(e) = task.await {
                error!(sequence, "Batch task did not complete: {}", e);
                if let Some(inner) = owner.upgrade() {
                    inner.abandon(sequence);
                }
            }
        }
        .boxed()
        .shared();

        state.in_flight = Some(InFlight { sequence, items: take, completion, task: abort });
    }

    async fn run_batch(self: Arc<Self>, sequence: u64, batch: Vec<T>) {
        let outcome = AssertUnwindSafe(self.operation.process(&batch)).catch_unwind().await;
        let result = outcome.unwrap_or_else(|payload| {
            Err(Box::new(OperationPanicked::from_payload(payload.as_ref())) as OperationError)
        });

        match result {
            Ok(()) => self.complete_success(sequence, batch.len()),
            Err(source) => self.complete_failure(sequence, batch, source),
        }
    }

    fn complete_success(self: &Arc<Self>, sequence: u64, items: usize) {
        let mut state = self.lock_state();
        state.in_flight = None;
        state.counters.batches_succeeded += 1;
        state.counters.items_processed += items as u64;
        debug!(sequence, items, pending = state.pending.len(), "Batch completed");
        self.dispatch_locked(&mut state);
    }

    fn complete_failure(&self, sequence: u64, batch: Vec<T>, source: OperationError) {
        let delivery = {
            let mut state = self.lock_state();
            state.in_flight = None;
            state.counters.batches_failed += 1;
            state.restore_front(&batch);
            warn!(
                sequence,
                items = batch.len(),
                pending = state.pending.len(),
                error = %source,
                "Batch failed, items returned to the front of the queue"
            );
            let state = &mut *state;
            self.reporting.route(PipelineError::BatchFailed { items: batch, source }, &mut state.unreported)
        };

        if let Some(delivery) = delivery {
            delivery.deliver();
        }
    }

    /// Frees the slot of a batch task that was cancelled before completing.
    fn abandon(&self, sequence: u64) {
        release_cancelled(&mut self.lock_state(), sequence);
    }
}

fn release_cancelled<T>(state: &mut PipelineState<T>, sequence: u64) {
    if let Some(in_flight) = state.in_flight.take_if(|f| f.sequence == sequence) {
        warn!(sequence, items = in_flight.items, "Releasing in-flight slot of cancelled batch, its items are lost");
    }
}
