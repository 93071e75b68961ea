//! Concrete [`crate::distributed::broker::Broker`] adapters.

pub mod file;
pub mod memory;
pub mod postgres;

pub use file::FileBroker;
pub use memory::InMemoryBroker;
pub use postgres::PostgresBroker;
