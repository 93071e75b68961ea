//! Configuration models for pools and distributed tasks.

pub mod pool;
pub mod task;

pub use pool::{PoolConfig, StrictPoolConfig};
pub use task::{SerializerKind, TaskConfig};
