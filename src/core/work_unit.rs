//! The work unit type submitted to a pool, and the message envelope the staging
//! queue carries between producers and workers.

use std::future::Future;
use std::pin::Pin;

use super::result_slot::ResultSink;

/// A deferred computation a pool will execute once.
///
/// Boxed so a single staging queue can carry arbitrarily-shaped futures that all
/// produce the pool's result type `T`.
pub type WorkUnit<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// A work unit bundled with the sink half of its result slot and the admission
/// permit it was let in on, as stored in the staging queue between being pushed
/// and being claimed by a worker. Holding the permit here ties its lifetime to the
/// unit's full time in the pool, queued or running, not just the time it spends in
/// the channel.
pub(crate) struct QueuedUnit<T> {
    pub(crate) unit: WorkUnit<T>,
    pub(crate) sink: ResultSink<T>,
    pub(crate) _admission: tokio::sync::OwnedSemaphorePermit,
}

/// The item type carried by a pool's staging channel: either a unit of work, or a
/// shutdown sentinel. Exactly one sentinel is enqueued per worker when the pool is
/// closed, so every worker observes one and terminates after completing whatever
/// unit it was already running.
pub(crate) enum Message<T> {
    /// A unit of work to execute.
    Task(QueuedUnit<T>),
    /// Tells the worker that pops it to stop.
    Shutdown,
}
