//! Appointment service: patient requests and admin scheduling.

use std::sync::Arc;

use crate::domain::appointment::{cancel_schema, request_schema, schedule_schema};
use crate::domain::{
    find_doctor, Appointment, AppointmentRequest, AppointmentSummary, AppointmentUpdate, Doctor,
    Draft, Patient, Schema,
};
use crate::ports::Persistence;
use crate::CarepulseError;

/// Number of appointments loaded for the admin dashboard.
pub const DASHBOARD_LIMIT: usize = 100;

/// What the success page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub appointment: Appointment,
    /// `None` when the physician is not in the doctor list.
    pub doctor: Option<&'static Doctor>,
}

pub struct AppointmentService<P: Persistence> {
    storage: Arc<P>,
    request: Schema,
    schedule: Schema,
    cancel: Schema,
}

impl<P> AppointmentService<P>
where
    P: Persistence,
    P::Error: Into<crate::adapters::StorageError>,
{
    pub fn new(storage: Arc<P>) -> Self {
        Self {
            storage,
            request: request_schema(),
            schedule: schedule_schema(),
            cancel: cancel_schema(),
        }
    }

    #[must_use]
    pub fn request_schema(&self) -> &Schema {
        &self.request
    }

    #[must_use]
    pub fn schedule_schema(&self) -> &Schema {
        &self.schedule
    }

    #[must_use]
    pub fn cancel_schema(&self) -> &Schema {
        &self.cancel
    }

    /// Create a pending appointment for a patient.
    ///
    /// # Errors
    /// Returns a validation error for an invalid draft, or a storage error.
    pub fn request(&self, patient: &Patient, draft: &Draft) -> Result<Appointment, CarepulseError> {
        let request = AppointmentRequest::from_draft(&self.request, draft)?;
        let payload = request.into_payload(&patient.profile.user_id, &patient.id);
        let appointment = self
            .storage
            .create_appointment(&payload)
            .map_err(|e| CarepulseError::Storage(e.into()))?;
        tracing::info!("Appointment {} requested", appointment.id);
        Ok(appointment)
    }

    /// Load an appointment and its doctor for the success page.
    ///
    /// An empty or unknown id yields `Ok(None)`.
    ///
    /// # Errors
    /// Returns error if storage fails.
    pub fn confirmation(&self, appointment_id: &str) -> Result<Option<Confirmation>, CarepulseError> {
        if appointment_id.is_empty() {
            return Ok(None);
        }
        let appointment = self
            .storage
            .get_appointment(appointment_id)
            .map_err(|e| CarepulseError::Storage(e.into()))?;
        Ok(appointment.map(|appointment| {
            let doctor = find_doctor(&appointment.primary_physician);
            if doctor.is_none() {
                tracing::debug!(
                    "No doctor record for physician of appointment {}",
                    appointment.id
                );
            }
            Confirmation {
                appointment,
                doctor,
            }
        }))
    }

    /// Counts and list for the admin dashboard.
    ///
    /// # Errors
    /// Returns error if storage fails.
    pub fn admin_summary(&self) -> Result<AppointmentSummary, CarepulseError> {
        let counts = self
            .storage
            .count_appointments_by_status()
            .map_err(|e| CarepulseError::Storage(e.into()))?;
        let appointments = self
            .storage
            .list_appointments(DASHBOARD_LIMIT)
            .map_err(|e| CarepulseError::Storage(e.into()))?;
        Ok(AppointmentSummary::new(counts, appointments))
    }

    /// Confirm an appointment.
    ///
    /// # Errors
    /// Returns a validation error for an invalid draft, or a storage error.
    pub fn schedule(&self, id: &str, draft: &Draft) -> Result<Appointment, CarepulseError> {
        let update = AppointmentUpdate::schedule_from_draft(&self.schedule, draft)?;
        self.apply(id, &update)
    }

    /// Cancel an appointment.
    ///
    /// # Errors
    /// Returns a validation error for an invalid draft, or a storage error.
    pub fn cancel(&self, id: &str, draft: &Draft) -> Result<Appointment, CarepulseError> {
        let update = AppointmentUpdate::cancel_from_draft(&self.cancel, draft)?;
        self.apply(id, &update)
    }

    /// Dashboard appointments as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns error if storage or serialization fails.
    pub fn export_json(&self) -> Result<String, CarepulseError> {
        let summary = self.admin_summary()?;
        Ok(serde_json::to_string_pretty(&summary.appointments)?)
    }

    fn apply(&self, id: &str, update: &AppointmentUpdate) -> Result<Appointment, CarepulseError> {
        self.storage
            .update_appointment(id, update)
            .map_err(|e| CarepulseError::Storage(e.into()))
    }
}
