//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application.

mod appointments;
mod form;
mod gate;
mod registration;

pub use appointments::{AppointmentService, Confirmation, DASHBOARD_LIMIT};
pub use form::{FormSession, SubmitAttempt};
pub use gate::{AccessGate, GateDecision, GateError, GateState, ACCESS_KEY_SLOT, PASSKEY_LENGTH};
pub use registration::RegistrationService;
