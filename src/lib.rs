//! # Carepulse
//!
//! Patient registration and appointment booking with a passkey-gated admin
//! dashboard.
//!
//! This crate provides:
//! - A declarative form engine used for sign-up, registration and appointments
//! - An access gate keeping an obfuscated credential in session storage
//! - Terminal UI standing in for the browser
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (schemas, patients, appointments, routes)
//! - `ports`: Trait definitions for persistence and session storage
//! - `adapters`: Concrete implementations (SQLite, in-memory session, log sanitizer)
//! - `application`: Use cases orchestrating domain and ports
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use domain::{Appointment, Patient, Route, User};

/// Result type for Carepulse operations
pub type Result<T> = std::result::Result<T, CarepulseError>;

/// Main error type for Carepulse
#[derive(Debug, thiserror::Error)]
pub enum CarepulseError {
    #[error("Invalid form data: {0}")]
    Validation(domain::ValidationReport),

    #[error("Storage operation failed: {0}")]
    Storage(#[from] adapters::StorageError),

    #[error(transparent)]
    Gate(#[from] application::GateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<domain::ValidationReport> for CarepulseError {
    fn from(report: domain::ValidationReport) -> Self {
        Self::Validation(report)
    }
}
