//! In-memory broker backend. The default choice for tests and single-process
//! deployments; grounded on the teacher's in-memory mailbox/queue pattern of a
//! `HashMap`-keyed store, combined with the async-notify wakeup idiom from
//! [`crate::core::condvar`] so a blocked `pop_blocking` observes a push without
//! polling.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use crate::core::error::PoolError;
use crate::distributed::broker::Broker;

#[derive(Default)]
struct QueueState {
    items: VecDeque<Vec<u8>>,
}

/// A broker backed by process-local memory. Payloads do not survive the
/// process; use [`crate::infra::broker::file::FileBroker`] for durability.
pub struct InMemoryBroker {
    queues: Mutex<HashMap<String, QueueState>>,
    notify: Notify,
}

impl InMemoryBroker {
    /// Create an empty broker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            queues: Mutex::new(HashMap::new()),
            notify: Notify::new(),
        }
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Broker for InMemoryBroker {
    async fn push_blocking(&self, queue_name: &str, payload: Vec<u8>) -> Result<(), PoolError> {
        let mut queues = self.queues.lock().await;
        queues
            .entry(queue_name.to_string())
            .or_default()
            .items
            .push_back(payload);
        drop(queues);
        self.notify.notify_waiters();
        Ok(())
    }

    async fn pop_blocking(
        &self,
        queue_name: &str,
        timeout: Duration,
    ) -> Result<Option<Vec<u8>>, PoolError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            {
                let mut queues = self.queues.lock().await;
                if let Some(item) = queues
                    .get_mut(queue_name)
                    .and_then(|q| q.items.pop_front())
                {
                    return Ok(Some(item));
                }
            }

            let notified = self.notify.notified();
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            if tokio::time::timeout(remaining, notified).await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn length(&self, queue_name: &str) -> Result<usize, PoolError> {
        let queues = self.queues.lock().await;
        Ok(queues.get(queue_name).map_or(0, |q| q.items.len()))
    }

    async fn clear(&self, queue_name: &str) -> Result<(), PoolError> {
        let mut queues = self.queues.lock().await;
        if let Some(queue) = queues.get_mut(queue_name) {
            queue.items.clear();
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), PoolError> {
        Ok(())
    }
}
