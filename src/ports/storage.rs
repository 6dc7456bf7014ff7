//! Persistence port: Trait for the remote data store.
//!
//! The application treats storage as an opaque request/response service
//! that creates and reads entities addressed by generated identifiers.

use crate::domain::{
    Appointment, AppointmentPayload, AppointmentStatus, AppointmentUpdate, Attachment, NewUser,
    Patient, PatientPayload, StoredFile, User,
};

/// Trait for the persistence collaborator.
pub trait Persistence: Send + Sync {
    /// Error type for storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Create a user, or return the existing user with the same email.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn create_user(&self, user: &NewUser) -> Result<User, Self::Error>;

    /// Load a user by id.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn get_user(&self, id: &str) -> Result<Option<User>, Self::Error>;

    /// Store an uploaded document.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn upload_document(&self, attachment: &Attachment) -> Result<StoredFile, Self::Error>;

    /// Create a patient record.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn create_patient(&self, patient: &PatientPayload) -> Result<Patient, Self::Error>;

    /// Load the most recent patient record of a user.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn get_patient(&self, user_id: &str) -> Result<Option<Patient>, Self::Error>;

    /// Create an appointment.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn create_appointment(&self, appointment: &AppointmentPayload)
        -> Result<Appointment, Self::Error>;

    /// Load an appointment by id.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn get_appointment(&self, id: &str) -> Result<Option<Appointment>, Self::Error>;

    /// Apply an administrative update and return the updated appointment.
    ///
    /// # Errors
    /// Returns error if the appointment does not exist or storage fails.
    fn update_appointment(
        &self,
        id: &str,
        update: &AppointmentUpdate,
    ) -> Result<Appointment, Self::Error>;

    /// Load appointments, most recent first (up to `limit`).
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn list_appointments(&self, limit: usize) -> Result<Vec<Appointment>, Self::Error>;

    /// Number of appointments per status, across all stored appointments.
    /// Statuses with no appointments may be omitted.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn count_appointments_by_status(
        &self,
    ) -> Result<Vec<(AppointmentStatus, usize)>, Self::Error>;
}
