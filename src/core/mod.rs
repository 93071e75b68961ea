//! The pool engine: error taxonomy, result slots, the work unit envelope, the
//! async monitor primitive, the two pool flavors, and the process-wide drain
//! registry.

pub mod condvar;
pub mod error;
pub mod pool;
pub mod registry;
pub mod result_slot;
pub mod strict_pool;
pub mod work_unit;

pub use error::PoolError;
pub use pool::{Pool, PoolPermit};
pub use registry::shutdown_all;
pub use result_slot::ResultHandle;
pub use strict_pool::StrictPool;
pub use work_unit::WorkUnit;
