//! Error reporting policy.
//!
//! A pipeline either delivers every error to a callback as it happens, or
//! accumulates errors for [`Pipeline::flush`](crate::Pipeline::flush) to
//! surface one at a time. The mode is chosen once, when the pipeline is built.

use crate::error::PipelineError;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// Callback receiving every admission rejection and batch failure.
pub type ErrorCallback<T> = Arc<dyn Fn(PipelineError<T>) + Send + Sync>;

/// How a pipeline reports errors.
pub(crate) enum ErrorReporting<T> {
    /// Hand each error to the callback immediately.
    Deliver(ErrorCallback<T>),
    /// Queue errors until `flush` consumes them.
    Accumulate,
}

impl<T> ErrorReporting<T> {
    pub(crate) fn from_callback(callback: Option<ErrorCallback<T>>) -> Self {
        callback.map_or(ErrorReporting::Accumulate, ErrorReporting::Deliver)
    }

    pub(crate) fn is_callback(&self) -> bool {
        matches!(self, ErrorReporting::Deliver(_))
    }

    pub(crate) fn mode_name(&self) -> &'static str {
        match self {
            ErrorReporting::Deliver(_) => "callback",
            ErrorReporting::Accumulate => "accumulate",
        }
    }

    /// Routes `error` according to the mode.
    ///
    /// Called with the pipeline state locked. In accumulation mode the error is
    /// appended to `unreported` right away; in callback mode the returned
    /// [`Delivery`] must be run once the lock is released.
    #[must_use]
    pub(crate) fn route(
        &self,
        error: PipelineError<T>,
        unreported: &mut VecDeque<PipelineError<T>>,
    ) -> Option<Delivery<T>> {
        match self {
            ErrorReporting::Deliver(callback) => {
                Some(Delivery { callback: Arc::clone(callback), error })
            }
            ErrorReporting::Accumulate => {
                unreported.push_back(error);
                debug!(unreported = unreported.len(), "Error accumulated");
                None
            }
        }
    }
}

/// An error waiting to be handed to the callback.
pub(crate) struct Delivery<T> {
    callback: ErrorCallback<T>,
    error: PipelineError<T>,
}

impl<T> Delivery<T> {
    pub(crate) fn deliver(self) {
        (self.callback)(self.error);
    }
}
