//! JSON-lines batch sink.

use async_trait::async_trait;
use serde_json::{Value, json};
use sluice_core::{BatchOperation, OperationError};
use std::borrow::Cow;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

/// Errors produced by the sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// A batch held an item matching the `--fail-on` text.
    #[error("item '{0}' matches --fail-on pattern")]
    Rejected(String),
}

/// Appends each batch to a file as one line: `{"batch": <n>, "items": [...]}`.
///
/// Batches are numbered from 1 in the order they are written. With a fail-on
/// pattern, any batch holding a matching item is refused and nothing is written.
pub struct JsonLinesSink {
    file: Mutex<File>,
    written: AtomicU64,
    fail_on: Option<String>,
}

impl JsonLinesSink {
    /// Creates (or truncates) the output file.
    pub async fn create(path: &Path, fail_on: Option<String>) -> std::io::Result<Self> {
        let file = File::create(path).await?;
        Ok(Self { file: Mutex::new(file), written: AtomicU64::new(0), fail_on })
    }

    fn is_poisoned(&self, item: &Value) -> bool {
        self.fail_on.as_deref().is_some_and(|pattern| item_text(item).contains(pattern))
    }
}

fn item_text(item: &Value) -> Cow<'_, str> {
    match item {
        Value::String(text) => Cow::Borrowed(text.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

#[async_trait]
impl BatchOperation<Value> for JsonLinesSink {
    async fn process(&self, batch: &[Value]) -> Result<(), OperationError> {
        if let Some(item) = batch.iter().find(|item| self.is_poisoned(item)) {
            return Err(Box::new(SinkError::Rejected(item_text(item).into_owned())));
        }

        let mut file = self.file.lock().await;
        let sequence = self.written.fetch_add(1, Ordering::SeqCst) + 1;
        let mut line = serde_json::to_string(&json!({ "batch": sequence, "items": batch }))?;
        line.push('\n');
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!(batch = sequence, items = batch.len(), "Batch written");
        Ok(())
    }
}
