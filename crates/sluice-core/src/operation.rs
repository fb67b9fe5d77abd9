//! The caller-supplied batch operation.

use crate::error::OperationError;
use async_trait::async_trait;
use std::future::Future;

/// Processes one batch of items.
///
/// The pipeline never invokes an operation concurrently with itself. Returning
/// an error (or panicking) fails the whole batch: every item is kept and will be
/// offered again, in the same order, on the next dispatch.
///
/// Any `Fn(Vec<T>) -> impl Future<Output = Result<(), OperationError>>` closure
/// is an operation; implement the trait directly to avoid cloning the batch.
#[async_trait]
pub trait BatchOperation<T>: Send + Sync {
    /// Processes `batch`, in order.
    async fn process(&self, batch: &[T]) -> Result<(), OperationError>;
}

#[async_trait]
impl<T, F, Fut> BatchOperation<T> for F
where
    T: Clone + Send + Sync + 'static,
    F: Fn(Vec<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), OperationError>> + Send + 'static,
{
    async fn process(&self, batch: &[T]) -> Result<(), OperationError> {
        (self)(batch.to_vec()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Collect(Arc<Mutex<Vec<u32>>>);

    #[async_trait]
    impl BatchOperation<u32> for Collect {
        async fn process(&self, batch: &[u32]) -> Result<(), OperationError> {
            self.0.lock().unwrap().extend_from_slice(batch);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_closure_operation() {
        let op = |batch: Vec<u32>| async move {
            if batch.contains(&0) {
                return Err(OperationError::from("zero"));
            }
            Ok(())
        };
        assert!(op.process(&[1, 2]).await.is_ok());
        assert_eq!(op.process(&[1, 0]).await.unwrap_err().to_string(), "zero");
    }

    #[tokio::test]
    async fn test_struct_operation() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let op: Arc<dyn BatchOperation<u32>> = Arc::new(Collect(Arc::clone(&seen)));
        op.process(&[3, 4]).await.unwrap();
        op.process(&[5]).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![3, 4, 5]);
    }
}
