//! Adapters layer: Concrete implementations of ports.
//!
//! - `sqlite`: SQLite in place of the hosted backend
//! - `session`: in-process session store
//! - `sanitize`: PII filtering for logs

pub mod sanitize;
pub mod session;
pub mod sqlite;

// Re-export storage error for lib.rs
pub use sqlite::StorageError;
