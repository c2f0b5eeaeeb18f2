//! ultragol/crates/domains/src/lib.rs
//!
//! Domain models, store documents and port definitions for ULTRAGOL.

pub mod document;
pub mod errors;
pub mod models;
pub mod ports;
pub mod validation;

// Re-exporting for easier access in other crates
pub use document::*;
pub use errors::*;
pub use models::*;
pub use ports::*;
pub use validation::*;
