//! One-shot result slot shared between a worker and the submitter that is waiting
//! on its outcome.
//!
//! A slot is created with the work unit, handed to the staging queue, and resolved
//! exactly once by the worker that runs the unit — with a value, with an error, or
//! (only when the pool is dropped or force-shut-down without waiting) implicitly
//! canceled.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use super::error::PoolError;

/// The worker-facing half of a result slot.
pub(crate) struct ResultSink<T> {
    tx: oneshot::Sender<Result<T, PoolError>>,
}

/// The submitter-facing half of a result slot.
///
/// Awaiting a `ResultHandle` suspends until the worker that claimed the
/// corresponding work unit resolves it. If the pool is dropped (or the unit is
/// discarded) before that happens, the awaited future resolves to
/// [`PoolError::Canceled`].
pub struct ResultHandle<T> {
    rx: oneshot::Receiver<Result<T, PoolError>>,
}

/// Create a fresh, unresolved result slot.
pub(crate) fn slot<T>() -> (ResultSink<T>, ResultHandle<T>) {
    let (tx, rx) = oneshot::channel();
    (ResultSink { tx }, ResultHandle { rx })
}

impl<T> ResultSink<T> {
    /// Resolve the slot with a successful value.
    pub(crate) fn resolve(self, value: T) {
        // The receiver may already be dropped if the submitter stopped caring
        // about the result; that is not an error for the worker.
        let _ = self.tx.send(Ok(value));
    }

    /// Resolve the slot with a captured failure.
    pub(crate) fn fail(self, err: PoolError) {
        let _ = self.tx.send(Err(err));
    }
}

impl<T> Future for ResultHandle<T> {
    type Output = Result<T, PoolError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(PoolError::Canceled)),
            Poll::Pending => Poll::Pending,
        }
    }
}
