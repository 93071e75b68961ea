//! File-backed broker, adapted from the teacher's Yaque-inspired JSON-lines
//! queue: each named queue is one `<queue_name>.jsonl` file under a base
//! directory, rewritten in full on every pop. Durable across restarts; not
//! intended for high-throughput use.

use std::collections::VecDeque;
use std::fs::{create_dir_all, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::core::error::PoolError;
use crate::distributed::broker::Broker;
use crate::util::clock::now_ms;

#[derive(Serialize, Deserialize)]
struct Record {
    stamped_ms: u128,
    payload: Vec<u8>,
}

struct QueueFile {
    records: VecDeque<Record>,
}

/// A broker that persists each queue as a JSON-lines file under `base_dir`.
pub struct FileBroker {
    base_dir: PathBuf,
    queues: Mutex<std::collections::HashMap<String, QueueFile>>,
}

impl FileBroker {
    /// Open (creating if needed) a file broker rooted at `base_dir`.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self, PoolError> {
        let base_dir = base_dir.as_ref().to_path_buf();
        create_dir_all(&base_dir)
            .map_err(|e| PoolError::BrokerUnavailable(e.to_string()))?;
        Ok(Self {
            base_dir,
            queues: Mutex::new(std::collections::HashMap::new()),
        })
    }

    fn file_path(&self, queue_name: &str) -> PathBuf {
        self.base_dir.join(format!("{queue_name}.jsonl"))
    }

    fn load(&self, queue_name: &str) -> Result<QueueFile, PoolError> {
        let path = self.file_path(queue_name);
        let mut records = VecDeque::new();
        if path.exists() {
            let file = OpenOptions::new()
                .read(true)
                .open(&path)
                .map_err(|e| PoolError::BrokerUnavailable(e.to_string()))?;
            for line in BufReader::new(file).lines() {
                let line = line.map_err(|e| PoolError::BrokerUnavailable(e.to_string()))?;
                let record: Record = serde_json::from_str(&line)
                    .map_err(|e| PoolError::DeserializationFailed(e.to_string()))?;
                records.push_back(record);
            }
        }
        Ok(QueueFile { records })
    }

    fn rewrite(&self, queue_name: &str, queue: &QueueFile) -> Result<(), PoolError> {
        let path = self.file_path(queue_name);
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| PoolError::BrokerUnavailable(e.to_string()))?;
        for record in &queue.records {
            let line = serde_json::to_string(record)
                .map_err(|e| PoolError::DeserializationFailed(e.to_string()))?;
            writeln!(file, "{line}").map_err(|e| PoolError::BrokerUnavailable(e.to_string()))?;
        }
        Ok(())
    }
}

#[async_trait]
impl Broker for FileBroker {
    async fn push_blocking(&self, queue_name: &str, payload: Vec<u8>) -> Result<(), PoolError> {
        let mut queues = self.queues.lock().await;
        if !queues.contains_key(queue_name) {
            queues.insert(queue_name.to_string(), self.load(queue_name)?);
        }
        let queue = queues.get_mut(queue_name).expect("just inserted");
        queue.records.push_back(Record {
            stamped_ms: now_ms(),
            payload,
        });
        self.rewrite(queue_name, queue)
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
                if !queues.contains_key(queue_name) {
                    queues.insert(queue_name.to_string(), self.load(queue_name)?);
                }
                let queue = queues.get_mut(queue_name).expect("just inserted");
                if let Some(record) = queue.records.pop_front() {
                    self.rewrite(queue_name, queue)?;
                    return Ok(Some(record.payload));
                }
            }

            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            tokio::time::sleep(remaining.min(Duration::from_millis(50))).await;
        }
    }

    async fn length(&self, queue_name: &str) -> Result<usize, PoolError> {
        let mut queues = self.queues.lock().await;
        if !queues.contains_key(queue_name) {
            queues.insert(queue_name.to_string(), self.load(queue_name)?);
        }
        Ok(queues.get(queue_name).map_or(0, |q| q.records.len()))
    }

    async fn clear(&self, queue_name: &str) -> Result<(), PoolError> {
        let mut queues = self.queues.lock().await;
        let queue = QueueFile {
            records: VecDeque::new(),
        };
        self.rewrite(queue_name, &queue)?;
        queues.insert(queue_name.to_string(), queue);
        Ok(())
    }

    async fn close(&self) -> Result<(), PoolError> {
        Ok(())
    }
}
