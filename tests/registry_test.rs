//! Integration tests for the process-wide drain registry.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use aio_pool::config::PoolConfig;
use aio_pool::core::pool::Pool;
use aio_pool::core::registry::shutdown_all;
use serial_test::serial;

// The registry is a single process-wide static, so these tests run serially:
// otherwise one test's shutdown_all() would drain pools another test is still
// using.

#[tokio::test]
#[serial]
async fn shutdown_all_drains_every_live_pool_registered_so_far() {
    let completed = Arc::new(AtomicUsize::new(0));

    let pool_a: Pool<()> = Pool::new(PoolConfig::new(2, 8));
    let pool_b: Pool<()> = Pool::new(PoolConfig::new(2, 8));

    for pool in [&pool_a, &pool_b] {
        for _ in 0..5 {
            let completed = Arc::clone(&completed);
            pool.submit(Box::pin(async move {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                completed.fetch_add(1, Ordering::SeqCst);
            }))
            .await
            .unwrap();
        }
    }

    shutdown_all().await;

    assert_eq!(completed.load(Ordering::SeqCst), 10);
    assert!(pool_a.submit(Box::pin(async {})).await.is_err());
    assert!(pool_b.submit(Box::pin(async {})).await.is_err());
}

#[tokio::test]
#[serial]
async fn shutdown_all_is_a_no_op_when_nothing_is_registered_or_everything_is_already_closed() {
    let pool: Pool<()> = Pool::new(PoolConfig::new(1, 1));
    pool.shutdown(true).await;
    // Should not panic or hang even though the pool is already closed.
    shutdown_all().await;
}
