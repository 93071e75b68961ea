//! Configuration for [`crate::core::pool::Pool`] and
//! [`crate::core::strict_pool::StrictPool`].

use serde::{Deserialize, Serialize};

/// Configuration for a back-pressured [`crate::core::pool::Pool`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Number of workers running concurrently; the pool never executes more than
    /// this many work units at once.
    pub max_concurrency: usize,
    /// Capacity of the staging queue between submitters and workers. A value of
    /// `0` means every `submit` call must be accepted directly by a worker.
    pub max_queue_size: usize,
}

impl PoolConfig {
    /// Build a new configuration. Panics are avoided here; call [`Self::validate`]
    /// before constructing a pool if the values come from an untrusted source.
    #[must_use]
    pub fn new(max_concurrency: usize, max_queue_size: usize) -> Self {
        Self {
            max_concurrency,
            max_queue_size,
        }
    }

    /// Validate that `max_concurrency` is positive. `max_queue_size` of zero is a
    /// legal, if degenerate, configuration (spec scenario 2).
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrency == 0 {
            return Err("max_concurrency must be greater than 0".into());
        }
        Ok(())
    }
}

/// Configuration for a [`crate::core::strict_pool::StrictPool`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StrictPoolConfig {
    /// Maximum number of work units allowed to be in flight at any instant.
    pub max_concurrency: usize,
}

impl StrictPoolConfig {
    /// Build a new configuration.
    #[must_use]
    pub fn new(max_concurrency: usize) -> Self {
        Self { max_concurrency }
    }

    /// Validate that `max_concurrency` is positive.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrency == 0 {
            return Err("max_concurrency must be greater than 0".into());
        }
        Ok(())
    }
}
