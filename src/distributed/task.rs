//! Binding a function to a named broker queue: the distributed counterpart of
//! [`crate::core::pool::Pool`], described in spec section 4.6.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex as SyncMutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::{SerializerKind, TaskConfig};
use crate::core::error::PoolError;
use crate::core::pool::Pool;

use super::broker::Broker;
use super::serializer;

/// How long a single consumer iteration waits on an empty broker before
/// re-checking whether it has been asked to stop.
const POP_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// A function bound to a named queue on a [`Broker`], with its own locally-owned
/// [`Pool`] bounding how many invocations run at once.
///
/// `submit` pushes an encoded call onto the broker without running anything
/// locally (the distributed, fire-and-forget path); `call` runs the function
/// immediately through the local pool without touching the broker at all (the
/// direct, synchronous-looking path, useful in tests and for local-only use);
/// `start_consuming`/`stop` drive the background loop that pops calls other
/// producers pushed and actually executes them.
pub struct Task<F, A, Fut, T>
where
    F: Fn(A) -> Fut + Send + Sync + 'static,
    A: Serialize + DeserializeOwned + Send + 'static,
    Fut: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    config: TaskConfig,
    func: Arc<F>,
    broker: Arc<dyn Broker>,
    pool: Pool<T>,
    stop: Arc<Notify>,
    stopped: Arc<AtomicBool>,
    consumer: SyncMutex<Option<JoinHandle<()>>>,
    _marker: PhantomData<fn(A) -> Fut>,
}

impl<F, A, Fut, T> Task<F, A, Fut, T>
where
    F: Fn(A) -> Fut + Send + Sync + 'static,
    A: Serialize + DeserializeOwned + Send + 'static,
    Fut: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    /// Bind `func` to `config.queue_name` on `broker`, starting a local pool
    /// sized from `config.local_pool_config()`.
    pub fn new(config: TaskConfig, broker: Arc<dyn Broker>, func: F) -> Result<Self, PoolError> {
        config
            .validate()
            .map_err(PoolError::InvalidConfig)?;
        let pool = Pool::new(config.local_pool_config());
        Ok(Self {
            config,
            func: Arc::new(func),
            broker,
            pool,
            stop: Arc::new(Notify::new()),
            stopped: Arc::new(AtomicBool::new(true)),
            consumer: SyncMutex::new(None),
            _marker: PhantomData,
        })
    }

    /// The queue name this task is bound to.
    #[must_use]
    pub fn queue_name(&self) -> &str {
        &self.config.queue_name
    }

    /// Run `func(args)` immediately through the local pool, bypassing the broker
    /// entirely. Suspends for room the same way [`Pool::run`] does.
    pub async fn call(&self, args: A) -> Result<T, PoolError> {
        let func = Arc::clone(&self.func);
        self.pool.run(Box::pin(async move { func(args).await })).await
    }

    /// Encode `args` and push it onto the bound broker queue without executing
    /// anything locally.
    pub async fn submit(&self, args: A) -> Result<(), PoolError> {
        let payload = serializer::encode(self.config.serializer, &args)?;
        self.broker
            .push_blocking(&self.config.queue_name, payload)
            .await
    }

    /// Start the background consumer loop, if it is not already running. Each
    /// iteration reserves a slot in the local pool *before* popping a payload off
    /// the broker, so the consumer never pulls work the local pool would have to
    /// refuse.
    pub async fn start_consuming(&self) -> Result<(), PoolError> {
        let mut guard = self.consumer.lock();
        if guard.is_some() {
            return Ok(());
        }

        self.stopped.store(false, Ordering::Release);
        let broker = Arc::clone(&self.broker);
        let pool = self.pool.clone();
        let func = Arc::clone(&self.func);
        let queue_name = self.config.queue_name.clone();
        let serializer = self.config.serializer;
        let stop = Arc::clone(&self.stop);
        let stopped = Arc::clone(&self.stopped);

        let handle = tokio::spawn(async move {
            run_consumer_loop(broker, pool, func, queue_name, serializer, stop, stopped).await;
        });
        *guard = Some(handle);
        Ok(())
    }

    /// Stop the background consumer loop and wait for it to exit. In-flight
    /// units already admitted to the local pool keep running; they are only
    /// reaped by a subsequent [`Self::close`].
    pub async fn stop(&self) -> Result<(), PoolError> {
        self.stopped.store(true, Ordering::Release);
        self.stop.notify_waiters();
        let handle = self.consumer.lock().take();
        if let Some(handle) = handle {
            handle.await.map_err(PoolError::from)?;
        }
        Ok(())
    }

    /// Stop consuming, drain the local pool, and release the broker.
    pub async fn close(&self) -> Result<(), PoolError> {
        self.stop().await?;
        self.pool.shutdown(true).await;
        self.broker.close().await
    }

    /// Number of payloads currently waiting on this task's broker queue.
    pub async fn get_queue_size(&self) -> Result<usize, PoolError> {
        self.broker.length(&self.config.queue_name).await
    }

    /// Discard every payload currently waiting on this task's broker queue.
    pub async fn clear_queue(&self) -> Result<(), PoolError> {
        self.broker.clear(&self.config.queue_name).await
    }
}

async fn run_consumer_loop<F, A, Fut, T>(
    broker: Arc<dyn Broker>,
    pool: Pool<T>,
    func: Arc<F>,
    queue_name: String,
    serializer: SerializerKind,
    stop: Arc<Notify>,
    stopped: Arc<AtomicBool>,
) where
    F: Fn(A) -> Fut + Send + Sync + 'static,
    A: Serialize + DeserializeOwned + Send + 'static,
    Fut: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    loop {
        if stopped.load(Ordering::Acquire) {
            break;
        }

        let permit = tokio::select! {
            () = stop.notified() => break,
            permit = pool.reserve() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        let popped = tokio::select! {
            () = stop.notified() => break,
            popped = broker.pop_blocking(&queue_name, POP_POLL_INTERVAL) => popped,
        };

        match popped {
            Ok(Some(bytes)) => match serializer::decode::<A>(serializer, &bytes) {
                Ok(args) => {
                    let func = Arc::clone(&func);
                    let handle = permit.submit(Box::pin(async move { func(args).await }));
                    let queue_name = queue_name.clone();
                    tokio::spawn(async move {
                        if let Err(err) = handle.await {
                            warn!(queue = %queue_name, error = %err, "consumed call failed");
                        }
                    });
                }
                Err(err) => {
                    warn!(queue = %queue_name, error = %err, "discarding call that failed to decode");
                }
            },
            Ok(None) => {
                // Reserved a slot but the broker had nothing; drop the permit and
                // try again.
            }
            Err(err) => {
                warn!(queue = %queue_name, error = %err, "broker pop failed, stopping consumer");
                break;
            }
        }
    }
    debug!(queue = %queue_name, "consumer loop exited");
}

/// Object-safe surface over [`Task`], used by [`batch_consume`] to start several
/// differently-typed tasks' consumer loops together.
#[async_trait]
pub trait ConsumableTask: Send + Sync {
    /// See [`Task::start_consuming`].
    async fn start_consuming(&self) -> Result<(), PoolError>;
    /// See [`Task::stop`].
    async fn stop(&self) -> Result<(), PoolError>;
}

#[async_trait]
impl<F, A, Fut, T> ConsumableTask for Task<F, A, Fut, T>
where
    F: Fn(A) -> Fut + Send + Sync + 'static,
    A: Serialize + DeserializeOwned + Send + 'static,
    Fut: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    async fn start_consuming(&self) -> Result<(), PoolError> {
        Task::start_consuming(self).await
    }

    async fn stop(&self) -> Result<(), PoolError> {
        Task::stop(self).await
    }
}

/// Start every task's consumer loop concurrently. Fails fast if any one task
/// fails to start; tasks that already started are left running (call
/// [`ConsumableTask::stop`] on them individually to unwind).
pub async fn batch_consume(tasks: &[Arc<dyn ConsumableTask>]) -> Result<(), PoolError> {
    let attempts = tasks.iter().map(|task| task.start_consuming());
    let results = futures::future::join_all(attempts).await;
    for result in results {
        result?;
    }
    Ok(())
}
