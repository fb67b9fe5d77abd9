//! The batching pipeline.
//!
//! Items pushed into a [`Pipeline`] wait in a FIFO queue. Once the queue holds
//! `batch_size` items a batch is dispatched to the operation on a Tokio task.
//! Only one batch executes at a time; a successful batch immediately lets the
//! next one start, while a failed batch is put back at the front of the queue
//! and waits for the next push or [`Pipeline::flush`] to be retried.

mod dispatch;
mod state;

use crate::config::PipelineConfig;
use crate::error::{ConfigError, PipelineError};
use crate::metrics::PipelineMetrics;
use crate::operation::BatchOperation;
use crate::reporting::{ErrorCallback, ErrorReporting};
use state::PipelineState;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

/// Shared pipeline internals. Batch tasks hold a strong reference while they run.
struct Inner<T> {
    operation: Arc<dyn BatchOperation<T>>,
    batch_size: usize,
    reporting: ErrorReporting<T>,
    runtime: Handle,
    state: Mutex<PipelineState<T>>,
}

impl<T> Inner<T> {
    fn lock_state(&self) -> MutexGuard<'_, PipelineState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if !state.pending.is_empty() || !state.unreported.is_empty() {
            warn!(
                pending = state.pending.len(),
                unreported = state.unreported.len(),
                "Pipeline dropped before it was flushed"
            );
        }
    }
}

/// A bounded, self-draining batching pipeline.
///
/// `Pipeline` is a cheap handle: clones share the same queue and in-flight
/// slot. Mutators return `&Self` so calls can be chained.
pub struct Pipeline<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Pipeline<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T> Pipeline<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Starts building a pipeline around `operation`.
    pub fn builder<O>(operation: O) -> PipelineBuilder<T>
    where
        O: BatchOperation<T> + 'static,
    {
        PipelineBuilder {
            operation: Arc::new(operation),
            config: PipelineConfig::default(),
            on_error: None,
            runtime: None,
        }
    }

    /// Creates a pipeline with the default batch size, accumulating errors.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new<O>(operation: O) -> Result<Self, ConfigError>
    where
        O: BatchOperation<T> + 'static,
    {
        Self::builder(operation).build()
    }

    /// Pushes one item.
    pub fn push(&self, item: T) -> &Self {
        self.admit(vec![item])
    }

    /// Pushes several items, keeping their relative order.
    pub fn push_all<I>(&self, items: I) -> &Self
    where
        I: IntoIterator<Item = T>,
    {
        self.admit(items.into_iter().collect())
    }

    fn admit(&self, items: Vec<T>) -> &Self {
        if items.is_empty() {
            return self;
        }

        let delivery = {
            let mut state = self.inner.lock_state();
            if state.cordoned {
                state.counters.items_rejected += items.len() as u64;
                warn!(items = items.len(), "Pipeline is cordoned, rejecting new items");
                let state = &mut *state;
                self.inner
                    .reporting
                    .route(PipelineError::AdmissionRejected { items }, &mut state.unreported)
            } else {
                debug!(items = items.len(), pending = state.pending.len(), "Enqueueing items");
                state.pending.extend(items);
                if state.pending.len() >= self.inner.batch_size {
                    self.inner.dispatch_locked(&mut state);
                }
                None
            }
        };

        if let Some(delivery) = delivery {
            delivery.deliver();
        }
        self
    }

    /// Blocks (`true`) or reopens (`false`) admission of new items.
    ///
    /// Items already queued are unaffected and still drain. Items rejected while
    /// cordoned are not re-admitted when the cordon is lifted.
    pub fn cordon(&self, cordoned: bool) -> &Self {
        let mut state = self.inner.lock_state();
        if state.cordoned != cordoned {
            info!(cordoned, pending = state.pending.len(), "Pipeline cordon changed");
        }
        state.cordoned = cordoned;
        self
    }

    /// Drains the pipeline.
    ///
    /// Keeps dispatching batches and waiting for them until nothing is pending
    /// or executing, stopping early as soon as an error is waiting to be
    /// reported. Returns the oldest unreported error, if any, removing it; call
    /// again to continue draining. In callback mode errors are never
    /// unreported, so a batch that keeps failing is retried until it succeeds.
    pub async fn flush(&self) -> Result<(), PipelineError<T>> {
        loop {
            let completion = {
                let mut state = self.inner.lock_state();
                if !state.unreported.is_empty() {
                    break;
                }
                self.inner.dispatch_locked(&mut state);
                match &state.in_flight {
                    Some(in_flight) => in_flight.completion.clone(),
                    None => break,
                }
            };
            completion.await;
        }

        let oldest = self.inner.lock_state().unreported.pop_front();
        match oldest {
            Some(error) => {
                debug!(items = error.items().len(), "Flush surfacing unreported error");
                Err(error)
            }
            None => Ok(()),
        }
    }

    /// Gives `edit` exclusive access to the pending queue.
    ///
    /// The executing batch, if any, is not part of the queue. Editing does not
    /// trigger a dispatch. `edit` must not call back into the pipeline.
    pub fn modify_pending<R, F>(&self, edit: F) -> R
    where
        F: FnOnce(&mut VecDeque<T>) -> R,
    {
        let mut state = self.inner.lock_state();
        edit(&mut state.pending)
    }

    /// Copy of the pending queue, oldest first.
    pub fn pending_items(&self) -> Vec<T> {
        self.inner.lock_state().pending.iter().cloned().collect()
    }
}

impl<T> Pipeline<T> {
    /// Number of items waiting for a batch.
    pub fn pending_len(&self) -> usize {
        self.inner.lock_state().pending.len()
    }

    /// Whether a batch is executing.
    pub fn is_in_flight(&self) -> bool {
        self.inner.lock_state().in_flight.is_some()
    }

    /// Whether admission is blocked.
    pub fn is_cordoned(&self) -> bool {
        self.inner.lock_state().cordoned
    }

    /// Number of errors waiting for `flush`.
    pub fn unreported_len(&self) -> usize {
        self.inner.lock_state().unreported.len()
    }

    /// Returns `true` when nothing is pending, executing, or unreported.
    pub fn is_flushed(&self) -> bool {
        self.inner.lock_state().is_quiescent()
    }

    /// The configured batch size.
    pub fn batch_size(&self) -> usize {
        self.inner.batch_size
    }

    /// Whether errors go to a callback rather than being accumulated.
    pub fn reports_errors_via_callback(&self) -> bool {
        self.inner.reporting.is_callback()
    }

    /// Snapshot of queue sizes and running totals.
    pub fn metrics(&self) -> PipelineMetrics {
        self.inner.lock_state().metrics()
    }
}

impl<T> fmt::Debug for Pipeline<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Pipeline");
        debug.field("batch_size", &self.inner.batch_size).field("error_mode", &self.inner.reporting.mode_name());
        match self.inner.state.try_lock() {
            Ok(state) => debug.field("pending", &state.pending.len()),
            Err(TryLockError::Poisoned(poisoned)) => debug.field("pending", &poisoned.into_inner().pending.len()),
            Err(TryLockError::WouldBlock) => debug.field("pending", &format_args!("<locked>")),
        };
        debug.finish_non_exhaustive()
    }
}

/// Builder for [`Pipeline`].
pub struct PipelineBuilder<T> {
    operation: Arc<dyn BatchOperation<T>>,
    config: PipelineConfig,
    on_error: Option<ErrorCallback<T>>,
    runtime: Option<Handle>,
}

impl<T> PipelineBuilder<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Sets the batch size (default 8).
    #[must_use]
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    /// Takes every setting from `config`.
    #[must_use]
    pub fn config(mut self, config: &PipelineConfig) -> Self {
        self.config = config.clone();
        self
    }

    /// Delivers every error to `callback` instead of accumulating it for `flush`.
    #[must_use]
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(PipelineError<T>) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(callback));
        self
    }

    /// Runs batches on `runtime` instead of the current one.
    #[must_use]
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Builds the pipeline.
    ///
    /// Fails if the batch size is zero, or if no runtime was given and the
    /// caller is not inside a Tokio runtime.
    pub fn build(self) -> Result<Pipeline<T>, ConfigError> {
        self.config.validate()?;
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|e| ConfigError::NoRuntime(e.to_string()))?,
        };
        let reporting = ErrorReporting::from_callback(self.on_error);
        debug!(batch_size = self.config.batch_size, mode = reporting.mode_name(), "Pipeline created");

        Ok(Pipeline {
            inner: Arc::new(Inner {
                operation: self.operation,
                batch_size: self.config.batch_size,
                reporting,
                runtime,
                state: Mutex::new(PipelineState::new()),
            }),
        })
    }
}
