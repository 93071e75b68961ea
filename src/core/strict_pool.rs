//! The strict, queue-free concurrency bound: a monitor gates admission so at
//! most `max_concurrency` units ever execute at once, with no staging queue
//! buffering excess submissions. Described in spec section 4.4.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::config::StrictPoolConfig;

use super::condvar::AsyncCondvar;
use super::error::PoolError;
use super::work_unit::WorkUnit;

struct State {
    running: usize,
    closed: bool,
}

struct Inner {
    config: StrictPoolConfig,
    state: Mutex<State>,
    condvar: AsyncCondvar,
}

/// A pool with no staging queue: `submit` suspends the caller directly until a
/// slot among `max_concurrency` running units is free, runs the unit, then wakes
/// the next waiter. There is never a moment where more than `max_concurrency`
/// units are executing, and there is no intermediate buffer a unit can sit in
/// while waiting.
///
/// Built on an explicit monitor ([`AsyncCondvar`] plus a `tokio::sync::Mutex`
/// guarding the running count) rather than a semaphore or an event, so that the
/// check-and-increment of the running count and the wait for room happen under
/// the same lock with no gap a concurrent submitter could race into.
#[derive(Clone)]
pub struct StrictPool {
    inner: Arc<Inner>,
}

impl StrictPool {
    /// Construct a strict pool.
    ///
    /// # Panics
    ///
    /// Panics if `config.max_concurrency` is `0`; validate untrusted
    /// configuration with [`StrictPoolConfig::validate`] first.
    #[must_use]
    pub fn new(config: StrictPoolConfig) -> Self {
        config
            .validate()
            .unwrap_or_else(|e| panic!("invalid strict pool configuration: {e}"));

        Self {
            inner: Arc::new(Inner {
                config,
                state: Mutex::new(State {
                    running: 0,
                    closed: false,
                }),
                condvar: AsyncCondvar::new(),
            }),
        }
    }

    /// Number of units currently executing.
    pub async fn running_count(&self) -> usize {
        self.inner.state.lock().await.running
    }

    /// Submit a unit of work, suspending the caller until a slot is free, then
    /// running the unit to completion before returning its outcome.
    ///
    /// This is the monitor protocol in full:
    /// 1. Lock the shared state.
    /// 2. Wait (atomically releasing the lock while parked) while
    ///    `running == max_concurrency`.
    /// 3. Increment `running`, release the lock, and run the unit.
    /// 4. Decrement `running`, notify one waiter, and return the outcome.
    pub async fn submit<T>(&self, unit: WorkUnit<T>) -> Result<T, PoolError>
    where
        T: Send + 'static,
    {
        self.run(unit).await
    }

    /// Run a unit of work under the strict concurrency bound. Identical to
    /// [`Self::submit`]; kept as a separate name to mirror [`crate::core::pool::Pool::run`]
    /// for callers migrating between the two pool flavors.
    pub async fn run<T>(&self, unit: WorkUnit<T>) -> Result<T, PoolError>
    where
        T: Send + 'static,
    {
        {
            let guard = self.inner.state.lock().await;
            let mut guard = self
                .inner
                .condvar
                .wait_while(&self.inner.state, guard, |s| {
                    !s.closed && s.running >= self.inner.config.max_concurrency
                })
                .await;

            if guard.closed {
                return Err(PoolError::PoolClosed);
            }
            guard.running += 1;
        }

        let running = self.running_count().await;
        debug!(running, "strict pool admitted a unit");

        let outcome = match tokio::spawn(unit).await {
            Ok(value) => Ok(value),
            Err(join_err) => Err(PoolError::from(join_err)),
        };

        {
            let mut guard = self.inner.state.lock().await;
            guard.running -= 1;
        }
        self.inner.condvar.notify_one();

        outcome
    }

    /// Close the pool. In-flight units keep running to completion, but no new
    /// unit will be admitted: a submitter blocked waiting for room, or one that
    /// arrives after this call, receives [`PoolError::PoolClosed`] instead.
    ///
    /// If `wait` is true, suspends until `running_count()` reaches zero.
    pub async fn shutdown(&self, wait: bool) {
        {
            let mut guard = self.inner.state.lock().await;
            guard.closed = true;
        }
        self.inner.condvar.notify_all();

        if wait {
            let guard = self.inner.state.lock().await;
            let _ = self
                .inner
                .condvar
                .wait_while(&self.inner.state, guard, |s| s.running > 0)
                .await;
        }
    }
}
