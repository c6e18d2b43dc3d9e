//! Database-style backend implementations
//!
//! These backends hold the users collection as queryable documents, the way a
//! traditional document database would.

mod in_memory;
#[cfg(feature = "sqlite")]
pub mod sql;

pub use in_memory::InMemory;
#[cfg(feature = "sqlite")]
pub use sql::SqliteBackend;
