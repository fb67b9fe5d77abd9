//! Shared test utilities for Sluice Core integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use sluice_core::{BatchOperation, OperationError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Item that fails any batch containing it.
pub const POISON: i32 = -1;

/// Installs a test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Operation that records every batch it sees and fails batches holding [`POISON`].
///
/// Clones share their records, so a test can keep one clone and hand another
/// to the pipeline.
#[derive(Clone, Default)]
pub struct RecordingSink {
    attempts: Arc<Mutex<Vec<Vec<i32>>>>,
    accepted: Arc<Mutex<Vec<Vec<i32>>>>,
    active: Arc<AtomicUsize>,
    max_active: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every batch take `delay` to process.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every batch handed to the operation, failed ones included.
    pub fn attempts(&self) -> Vec<Vec<i32>> {
        self.attempts.lock().unwrap().clone()
    }

    /// Batches that were processed successfully.
    pub fn accepted(&self) -> Vec<Vec<i32>> {
        self.accepted.lock().unwrap().clone()
    }

    /// Successfully processed items in sink order.
    pub fn sink_order(&self) -> Vec<i32> {
        self.accepted().into_iter().flatten().collect()
    }

    /// Highest number of batches observed executing at once.
    pub fn max_concurrent(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BatchOperation<i32> for RecordingSink {
    async fn process(&self, batch: &[i32]) -> Result<(), OperationError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        self.attempts.lock().unwrap().push(batch.to_vec());

        match self.delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        if batch.contains(&POISON) {
            return Err(format!("poisoned batch {:?}", batch).into());
        }
        self.accepted.lock().unwrap().push(batch.to_vec());
        Ok(())
    }
}

/// Yields to the scheduler until `done` holds, giving up after a bounded number of turns.
pub async fn wait_until(mut done: impl FnMut() -> bool) {
    for _ in 0..1_000 {
        if done() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
