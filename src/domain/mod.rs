//! Domain layer: Core business types and logic.
//!
//! This module contains pure Rust types with no I/O beyond reading an
//! attachment from disk. Form schemas and their validation live here.

pub mod appointment;
pub mod credential;
pub mod doctor;
pub mod patient;
mod route;
pub mod schema;
mod user;

pub use appointment::{
    Appointment, AppointmentPayload, AppointmentRequest, AppointmentStatus, AppointmentSummary,
    AppointmentUpdate,
};
pub use credential::{CredentialError, PassKey};
pub use doctor::{find_doctor, Doctor, DOCTORS};
pub use patient::{Attachment, Gender, Patient, PatientPayload, PatientRegistration, StoredFile};
pub use route::Route;
pub use schema::{
    Draft, FieldError, FieldKind, FieldSpec, FieldValue, FileRef, Schema, SchemaError,
    ValidationReport,
};
pub use user::{sign_up_schema, NewUser, User};
