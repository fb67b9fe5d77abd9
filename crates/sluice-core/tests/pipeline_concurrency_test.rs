//! Concurrent producers against a single pipeline.

mod common;

use common::{RecordingSink, init_tracing};
use sluice_core::Pipeline;
use std::time::Duration;

const PRODUCERS: i32 = 8;
const ITEMS_PER_PRODUCER: i32 = 50;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_at_most_one_batch_in_flight() {
    init_tracing();
    let sink = RecordingSink::new().with_delay(Duration::from_millis(1));
    let pipeline = Pipeline::builder(sink.clone()).batch_size(4).build().unwrap();

    let mut handles = Vec::new();
    for producer in 0..PRODUCERS {
        let pipeline = pipeline.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..ITEMS_PER_PRODUCER {
                pipeline.push(producer * 1_000 + i);
                tokio::task::yield_now().await;
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
    pipeline.flush().await.unwrap();

    assert_eq!(sink.max_concurrent(), 1);
    assert!(sink.accepted().iter().all(|batch| !batch.is_empty() && batch.len() <= 4));

    let order = sink.sink_order();
    assert_eq!(order.len(), (PRODUCERS * ITEMS_PER_PRODUCER) as usize);

    let mut unique = order.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), order.len());

    // Each producer's items keep their relative order.
    for producer in 0..PRODUCERS {
        let mine: Vec<i32> = order.iter().copied().filter(|item| item / 1_000 == producer).collect();
        let expected: Vec<i32> = (0..ITEMS_PER_PRODUCER).map(|i| producer * 1_000 + i).collect();
        assert_eq!(mine, expected);
    }
    assert!(pipeline.is_flushed());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_flush_from_another_task() {
    let sink = RecordingSink::new().with_delay(Duration::from_millis(2));
    let pipeline = Pipeline::builder(sink.clone()).batch_size(3).build().unwrap();

    pipeline.push_all(0..10);
    let flusher = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move { pipeline.flush().await.is_ok() })
    };

    assert!(flusher.await.unwrap());
    assert_eq!(sink.sink_order(), (0..10).collect::<Vec<_>>());
    assert_eq!(sink.max_concurrent(), 1);
}
