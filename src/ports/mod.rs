//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (remote storage, the
//! browser-like session store).

mod session;
mod storage;

pub use session::SessionStore;
pub use storage::Persistence;
