//! # storage-adapters
//!
//! Implementations of the `DocumentStore` and `LocalStorage` ports.

mod subscriptions;

pub mod local_storage;
pub mod memory;
#[cfg(feature = "db-sqlite")]
pub mod sqlite;

pub use local_storage::{FileLocalStorage, MemoryLocalStorage};
pub use memory::MemoryDocumentStore;
#[cfg(feature = "db-sqlite")]
pub use sqlite::SqliteDocumentStore;
