//! Integration tests for [`StrictPool`]'s queue-free, monitor-gated admission.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use aio_pool::config::StrictPoolConfig;
use aio_pool::core::error::PoolError;
use aio_pool::core::strict_pool::StrictPool;

#[tokio::test]
async fn in_flight_count_never_exceeds_max_concurrency_under_heavy_fan_out() {
    let pool = StrictPool::new(StrictPoolConfig::new(6));
    let in_flight = Arc::new(AtomicUsize::new(0));
    let max_observed = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..120 {
        let pool = pool.clone();
        let in_flight = Arc::clone(&in_flight);
        let max_observed = Arc::clone(&max_observed);
        handles.push(tokio::spawn(async move {
            pool.run::<()>(Box::pin(async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_observed.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(3)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }))
            .await
            .unwrap();
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }
    assert!(max_observed.load(Ordering::SeqCst) <= 6);
}

#[tokio::test]
async fn submitters_queued_on_the_monitor_are_admitted_fairly_as_slots_free() {
    let pool = StrictPool::new(StrictPoolConfig::new(2));
    let order = Arc::new(tokio::sync::Mutex::new(Vec::new()));

    let mut handles = Vec::new();
    for i in 0..8 {
        let pool = pool.clone();
        let order = Arc::clone(&order);
        handles.push(tokio::spawn(async move {
            pool.run::<()>(Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                order.lock().await.push(i);
            }))
            .await
            .unwrap();
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(order.lock().await.len(), 8);
}

#[tokio::test]
async fn shutdown_without_wait_rejects_new_work_immediately() {
    let pool = StrictPool::new(StrictPoolConfig::new(4));
    pool.shutdown(false).await;
    let rejected = pool.submit::<i32>(Box::pin(async { 1 })).await;
    assert!(matches!(rejected, Err(PoolError::PoolClosed)));
}

#[tokio::test]
async fn running_count_reflects_admitted_units_only() {
    let pool = StrictPool::new(StrictPoolConfig::new(3));
    assert_eq!(pool.running_count().await, 0);

    let gate = Arc::new(tokio::sync::Notify::new());
    let mut handles = Vec::new();
    for _ in 0..3 {
        let pool = pool.clone();
        let gate = Arc::clone(&gate);
        handles.push(tokio::spawn(async move {
            pool.run::<()>(Box::pin(async move {
                gate.notified().await;
            }))
            .await
            .unwrap();
        }));
    }

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(pool.running_count().await, 3);

    gate.notify_waiters();
    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(pool.running_count().await, 0);
}
