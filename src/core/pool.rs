//! The back-pressured pool facade: a bounded staging queue, a fixed worker fleet,
//! and the `submit`/`run`/`batch_*`/`shutdown` surface described in spec section
//! 4.3.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex as SyncMutex;
use tokio::sync::{mpsc, Mutex as AsyncMutex, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::PoolConfig;

use super::error::PoolError;
use super::registry::{self, DrainablePool};
use super::result_slot::{self, ResultHandle};
use super::work_unit::{Message, QueuedUnit, WorkUnit};

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(0);

struct PoolInner<T> {
    id: u64,
    config: PoolConfig,
    tx: SyncMutex<Option<mpsc::Sender<Message<T>>>>,
    workers: SyncMutex<Vec<JoinHandle<()>>>,
    closed: AtomicBool,
    /// Gates admission into the pool: one permit per slot of combined staging-queue
    /// and in-flight capacity (`max_concurrency + max_queue_size`). A unit holds its
    /// permit from the moment it is admitted until its worker finishes running it,
    /// so the number of units sitting in the staging queue can never exceed
    /// `max_queue_size` once every worker is busy.
    admission: Arc<Semaphore>,
}

/// A bounded, back-pressured pool of `max_concurrency` workers draining a staging
/// queue of capacity `max_queue_size`.
///
/// Cloning a `Pool` is cheap (it is a handle around a shared `Arc`); every clone
/// refers to the same worker fleet and staging queue.
pub struct Pool<T: Send + 'static> {
    inner: Arc<PoolInner<T>>,
}

impl<T: Send + 'static> Clone for Pool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// A reservation against a pool's staging queue capacity that has not yet been
/// committed to a specific work unit.
///
/// Obtained from [`Pool::reserve`]. Useful when a caller needs to know there is
/// room in the pool *before* producing the unit to submit — the distributed task
/// layer's [`crate::distributed::Task::consume`] uses this to avoid popping a
/// payload off the broker that the local pool would just have to refuse.
pub struct PoolPermit<T: Send + 'static> {
    permit: mpsc::OwnedPermit<Message<T>>,
    admission: tokio::sync::OwnedSemaphorePermit,
}

impl<T: Send + 'static> PoolPermit<T> {
    /// Commit this reservation to a concrete work unit.
    pub fn submit(self, unit: WorkUnit<T>) -> ResultHandle<T> {
        let (sink, handle) = result_slot::slot();
        self.permit.send(Message::Task(QueuedUnit {
            unit,
            sink,
            _admission: self.admission,
        }));
        handle
    }
}

impl<T: Send + 'static> Pool<T> {
    /// Construct a pool and eagerly spawn its worker fleet.
    ///
    /// # Panics
    ///
    /// Panics if `config.max_concurrency` is `0`; validate untrusted configuration
    /// with [`PoolConfig::validate`] first.
    #[must_use]
    pub fn new(config: PoolConfig) -> Self {
        config
            .validate()
            .unwrap_or_else(|e| panic!("invalid pool configuration: {e}"));

        // Total admission capacity is max_concurrency (units actively running) plus
        // max_queue_size (units waiting their turn). A permit is held for a unit's
        // entire lifetime in the pool, so the raw channel never needs more room
        // than this and can never be asked for zero capacity even when
        // max_queue_size is configured as zero.
        let capacity = config.max_concurrency + config.max_queue_size;
        let (tx, rx) = mpsc::channel(capacity);
        let rx = Arc::new(AsyncMutex::new(rx));
        let id = NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed);

        let mut workers = Vec::with_capacity(config.max_concurrency);
        for worker_id in 0..config.max_concurrency {
            workers.push(spawn_worker(id, worker_id, Arc::clone(&rx)));
        }

        info!(pool_id = id, workers = config.max_concurrency, max_queue_size = config.max_queue_size, "pool started");

        let pool = Self {
            inner: Arc::new(PoolInner {
                id,
                config,
                tx: SyncMutex::new(Some(tx)),
                workers: SyncMutex::new(workers),
                closed: AtomicBool::new(false),
                admission: Arc::new(Semaphore::new(capacity)),
            }),
        };
        registry::register(Arc::clone(&pool.inner));
        pool
    }

    fn sender(&self) -> Result<mpsc::Sender<Message<T>>, PoolError> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(PoolError::PoolClosed);
        }
        self.inner
            .tx
            .lock()
            .clone()
            .ok_or(PoolError::PoolClosed)
    }

    /// Reserve a slot in the staging queue without committing a unit to it yet.
    /// Suspends until a slot is free. Fails with [`PoolError::PoolClosed`] if the
    /// pool is already shut down.
    pub async fn reserve(&self) -> Result<PoolPermit<T>, PoolError> {
        let admission = Arc::clone(&self.inner.admission)
            .acquire_owned()
            .await
            .map_err(|_| PoolError::PoolClosed)?;
        let tx = self.sender()?;
        let permit = tx.reserve_owned().await.map_err(|_| PoolError::PoolClosed)?;
        Ok(PoolPermit { permit, admission })
    }

    /// Submit a unit of work, suspending the caller if the staging queue is full.
    pub async fn submit(&self, unit: WorkUnit<T>) -> Result<ResultHandle<T>, PoolError> {
        let admission = Arc::clone(&self.inner.admission)
            .acquire_owned()
            .await
            .map_err(|_| PoolError::PoolClosed)?;
        let tx = self.sender()?;
        let (sink, handle) = result_slot::slot();
        tx.send(Message::Task(QueuedUnit {
            unit,
            sink,
            _admission: admission,
        }))
        .await
        .map_err(|_| PoolError::PoolClosed)?;
        Ok(handle)
    }

    /// Submit a unit of work without waiting for room; fails immediately with
    /// [`PoolError::QueueFull`] if the pool's combined staging-queue-and-in-flight
    /// capacity (`max_concurrency + max_queue_size`) is already fully admitted.
    pub fn try_submit(&self, unit: WorkUnit<T>) -> Result<ResultHandle<T>, PoolError> {
        let admission = Arc::clone(&self.inner.admission)
            .try_acquire_owned()
            .map_err(|e| match e {
                tokio::sync::TryAcquireError::NoPermits => PoolError::QueueFull,
                tokio::sync::TryAcquireError::Closed => PoolError::PoolClosed,
            })?;
        let tx = self.sender()?;
        let (sink, handle) = result_slot::slot();
        tx.try_send(Message::Task(QueuedUnit {
            unit,
            sink,
            _admission: admission,
        }))
        .map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => PoolError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => PoolError::PoolClosed,
        })?;
        Ok(handle)
    }

    /// Submit a unit and await its result.
    pub async fn run(&self, unit: WorkUnit<T>) -> Result<T, PoolError> {
        self.submit(unit).await?.await
    }

    /// Submit a unit and await its result without blocking for queue room;
    /// returns [`PoolError::QueueFull`] immediately if the queue has no space.
    pub async fn try_run(&self, unit: WorkUnit<T>) -> Result<T, PoolError> {
        self.try_submit(unit)?.await
    }

    /// Submit a batch of units in order. The whole batch is pushed from a single
    /// caller, but as spec section 9 notes, individual pushes may still interleave
    /// with other concurrent producers — `batch_submit` makes no atomicity claim
    /// across units.
    pub async fn batch_submit(
        &self,
        units: Vec<WorkUnit<T>>,
    ) -> Result<Vec<ResultHandle<T>>, PoolError> {
        let mut handles = Vec::with_capacity(units.len());
        for unit in units {
            handles.push(self.submit(unit).await?);
        }
        Ok(handles)
    }

    /// `batch_submit` followed by awaiting every handle, preserving input order in
    /// the output.
    pub async fn batch_run(&self, units: Vec<WorkUnit<T>>) -> Result<Vec<T>, PoolError> {
        let handles = self.batch_submit(units).await?;
        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(handle.await?);
        }
        Ok(results)
    }

    /// Mark the pool closed (further submissions fail with
    /// [`PoolError::PoolClosed`]), enqueue one shutdown sentinel per worker, and,
    /// if `wait` is true, suspend until every worker has terminated — which by
    /// construction happens only after every unit already accepted has been
    /// processed. Idempotent: a second call is a no-op.
    pub async fn shutdown(&self, wait: bool) {
        shutdown_inner(&self.inner, wait).await;
    }

    /// Current pool identifier, useful for correlating log lines in tests.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Run `body` with a fresh pool, guaranteeing `shutdown(true)` runs on every
    /// exit path — including a panic inside `body` — mirroring spec section 4.3's
    /// scoped-acquisition form.
    pub async fn scoped<F, Fut, R>(config: PoolConfig, body: F) -> R
    where
        F: FnOnce(Pool<T>) -> Fut,
        Fut: Future<Output = R>,
    {
        let pool = Pool::new(config);
        let result = AssertUnwindSafe(body(pool.clone())).catch_unwind().await;
        pool.shutdown(true).await;
        match result {
            Ok(value) => value,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

impl<T: Send + 'static> DrainablePool for PoolInner<T> {
    fn shutdown_boxed(&self) -> futures::future::BoxFuture<'_, ()> {
        Box::pin(shutdown_inner(self, true))
    }
}

async fn shutdown_inner<T: Send + 'static>(inner: &PoolInner<T>, wait: bool) {
    if inner.closed.swap(true, Ordering::AcqRel) {
        return;
    }

    debug!(pool_id = inner.id, "pool shutting down");

    inner.admission.close();
    let tx = inner.tx.lock().take();
    if let Some(tx) = tx {
        for _ in 0..inner.config.max_concurrency {
            let _ = tx.send(Message::Shutdown).await;
        }
    }

    if wait {
        let handles = std::mem::take(&mut *inner.workers.lock());
        for handle in handles {
            if let Err(err) = handle.await {
                warn!(pool_id = inner.id, error = %err, "worker task panicked during shutdown");
            }
        }
        info!(pool_id = inner.id, "pool shut down");
    }
}

fn spawn_worker<T: Send + 'static>(
    pool_id: u64,
    worker_id: usize,
    rx: Arc<AsyncMutex<mpsc::Receiver<Message<T>>>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let message = {
                let mut rx = rx.lock().await;
                rx.recv().await
            };

            let message = match message {
                Some(m) => m,
                None => {
                    debug!(pool_id, worker_id, "staging queue closed, worker exiting");
                    break;
                }
            };

            match message {
                Message::Shutdown => {
                    debug!(pool_id, worker_id, "worker received shutdown sentinel");
                    break;
                }
                Message::Task(QueuedUnit {
                    unit,
                    sink,
                    _admission,
                }) => {
                    // Run the unit on its own spawned task so a panic inside it
                    // surfaces as a JoinError instead of unwinding this worker.
                    // _admission is held across the run and released only once
                    // this block ends, so it counts toward capacity for the
                    // unit's whole time in the pool, not just while queued.
                    match tokio::spawn(unit).await {
                        Ok(value) => sink.resolve(value),
                        Err(join_err) => sink.fail(PoolError::from(join_err)),
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[tokio::test]
    async fn runs_a_unit_and_returns_its_value() {
        let pool: Pool<i32> = Pool::new(PoolConfig::new(2, 4));
        let result = pool.run(Box::pin(async { 2 + 2 })).await.unwrap();
        assert_eq!(result, 4);
        pool.shutdown(true).await;
    }

    #[tokio::test]
    async fn batch_run_preserves_order() {
        let pool: Pool<i32> = Pool::new(PoolConfig::new(4, 16));
        let units: Vec<_> = (0..10)
            .map(|i| -> WorkUnit<i32> { Box::pin(async move { i * 2 }) })
            .collect();
        let results = pool.batch_run(units).await.unwrap();
        assert_eq!(results, vec![0, 2, 4, 6, 8, 10, 12, 14, 16, 18]);
        pool.shutdown(true).await;
    }

    #[tokio::test]
    async fn try_submit_rejects_once_combined_capacity_is_exhausted() {
        // max_concurrency=2, max_queue_size=0: total admission capacity is 2,
        // independent of how fast the workers happen to drain the channel.
        let pool: Pool<()> = Pool::new(PoolConfig::new(2, 0));
        let slow = || {
            Box::pin(async {
                tokio::time::sleep(Duration::from_millis(200)).await;
            }) as WorkUnit<()>
        };

        let _h1 = pool.try_submit(slow()).unwrap();
        let _h2 = pool.try_submit(slow()).unwrap();
        for _ in 0..3 {
            assert!(matches!(pool.try_submit(slow()), Err(PoolError::QueueFull)));
        }
        pool.shutdown(true).await;
    }

    #[tokio::test]
    async fn failed_unit_resolves_with_error_and_pool_stays_usable() {
        let pool: Pool<i32> = Pool::new(PoolConfig::new(1, 4));
        let failure = pool
            .run(Box::pin(async { panic!("x") }))
            .await
            .unwrap_err();
        assert!(matches!(failure, PoolError::UnitFailed(ref m) if m == "x"));

        let ok = pool.run(Box::pin(async { 7 })).await.unwrap();
        assert_eq!(ok, 7);
        pool.shutdown(true).await;
    }

    #[tokio::test]
    async fn respects_max_concurrency_under_load() {
        let pool: Pool<()> = Pool::new(PoolConfig::new(5, 10));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_observed = Arc::new(AtomicUsize::new(0));

        let mut units: Vec<WorkUnit<()>> = Vec::new();
        for _ in 0..100 {
            let in_flight = Arc::clone(&in_flight);
            let max_observed = Arc::clone(&max_observed);
            units.push(Box::pin(async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_observed.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }));
        }

        pool.batch_run(units).await.unwrap();
        assert!(max_observed.load(Ordering::SeqCst) <= 5);
        pool.shutdown(true).await;
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let pool: Pool<()> = Pool::new(PoolConfig::new(2, 4));
        pool.shutdown(true).await;
        pool.shutdown(true).await;
        assert!(matches!(
            pool.submit(Box::pin(async {})).await,
            Err(PoolError::PoolClosed)
        ));
    }

    #[tokio::test]
    async fn scoped_shuts_down_on_panic() {
        let pool_id = Pool::<()>::scoped(PoolConfig::new(2, 4), |pool| async move {
            let id = pool.id();
            let outcome = std::panic::AssertUnwindSafe(async {
                pool.run(Box::pin(async { panic!("unreachable unit error") }))
                    .await
            })
            .catch_unwind()
            .await;
            assert!(outcome.is_ok(), "unit panic should be caught by the pool, not propagate");
            id
        })
        .await;
        let _ = pool_id;
    }
}
