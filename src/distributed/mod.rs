//! The distributed task layer: a minimal broker-backed task queue layered on
//! top of [`crate::core::pool::Pool`], described in spec section 4.6.

pub mod broker;
pub mod serializer;
pub mod task;

pub use broker::Broker;
pub use task::{batch_consume, ConsumableTask, Task};
