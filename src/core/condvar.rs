//! An async condition variable.
//!
//! `tokio::sync::Notify` is the async primitive closest to a condition variable,
//! but a bare `notify.notified().await` taken *after* releasing a lock can miss a
//! wakeup that lands in between: the notification has nowhere to be recorded until
//! the `notified()` future exists. [`AsyncCondvar`] closes that gap the way
//! `parking_lot::Condvar::wait` does for blocking code — by registering interest in
//! the next notification before giving up the lock, so a concurrent `notify_one`
//! that lands in the gap is still observed.
//!
//! This is the monitor primitive [`crate::core::strict_pool::StrictPool`] uses to
//! gate task admission: a mutex protects the shared state, and this condvar is
//! what a submitter blocks on while waiting for room.

use tokio::sync::{Mutex, MutexGuard, Notify};

/// An async condition variable, used together with a [`tokio::sync::Mutex`] guarding
/// the state the condition is evaluated over.
#[derive(Debug, Default)]
pub(crate) struct AsyncCondvar {
    notify: Notify,
}

impl AsyncCondvar {
    /// Create a new condition variable.
    pub(crate) fn new() -> Self {
        Self {
            notify: Notify::new(),
        }
    }

    /// Release `guard`, wait for a notification, then reacquire the mutex and
    /// return the new guard. Callers should re-check their condition in a loop;
    /// this method does not loop on your behalf (use [`Self::wait_while`] for that).
    pub(crate) async fn wait<'a, T>(
        &self,
        mutex: &'a Mutex<T>,
        guard: MutexGuard<'a, T>,
    ) -> MutexGuard<'a, T> {
        let notified = self.notify.notified();
        drop(guard);
        notified.await;
        mutex.lock().await
    }

    /// Wait until `condition` returns `false`, re-checking after every
    /// notification. Returns the guard held once the condition is satisfied.
    pub(crate) async fn wait_while<'a, T, F>(
        &self,
        mutex: &'a Mutex<T>,
        mut guard: MutexGuard<'a, T>,
        mut condition: F,
    ) -> MutexGuard<'a, T>
    where
        F: FnMut(&mut T) -> bool,
    {
        while condition(&mut guard) {
            guard = self.wait(mutex, guard).await;
        }
        guard
    }

    /// Wake one waiter, if any are currently waiting.
    pub(crate) fn notify_one(&self) {
        self.notify.notify_one();
    }

    /// Wake every current waiter.
    pub(crate) fn notify_all(&self) {
        self.notify.notify_waiters();
    }
}
