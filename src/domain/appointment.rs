//! Appointment requests and their lifecycle.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::doctor::doctor_names;
use super::schema::{
    Draft, FieldError, FieldKind, FieldSpec, Schema, ValidationReport, DATE_TIME_FORMAT,
};

/// Appointment lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    /// Requested by the patient, awaiting an administrator
    Pending,
    /// Confirmed by an administrator
    Scheduled,
    Cancelled,
}

impl AppointmentStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Scheduled => "scheduled",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "scheduled" => Ok(Self::Scheduled),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("Unknown appointment status: {other}")),
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub user_id: String,
    pub patient_id: String,
    pub primary_physician: String,
    pub schedule: NaiveDateTime,
    pub reason: String,
    pub note: Option<String>,
    pub status: AppointmentStatus,
    pub cancellation_reason: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Appointment as sent to storage on creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentPayload {
    pub user_id: String,
    pub patient_id: String,
    pub primary_physician: String,
    pub schedule: NaiveDateTime,
    pub reason: String,
    pub note: Option<String>,
    pub status: AppointmentStatus,
}

/// Administrative change to an existing appointment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppointmentUpdate {
    Schedule {
        primary_physician: String,
        schedule: NaiveDateTime,
        reason: Option<String>,
        note: Option<String>,
    },
    Cancel {
        cancellation_reason: String,
    },
}

impl AppointmentUpdate {
    /// Status the appointment ends up in after this update.
    #[must_use]
    pub fn status(&self) -> AppointmentStatus {
        match self {
            Self::Schedule { .. } => AppointmentStatus::Scheduled,
            Self::Cancel { .. } => AppointmentStatus::Cancelled,
        }
    }

    /// Validate a schedule draft.
    ///
    /// # Errors
    /// Returns the validation report if any field is invalid.
    pub fn schedule_from_draft(schema: &Schema, draft: &Draft) -> Result<Self, ValidationReport> {
        let report = schema.validate(draft);
        if !report.is_valid() {
            return Err(report);
        }
        Ok(Self::Schedule {
            primary_physician: draft.text("primaryPhysician").to_string(),
            schedule: parse_schedule(draft, report)?,
            reason: draft.optional_text("reason"),
            note: draft.optional_text("note"),
        })
    }

    /// Validate a cancellation draft.
    ///
    /// # Errors
    /// Returns the validation report if any field is invalid.
    pub fn cancel_from_draft(schema: &Schema, draft: &Draft) -> Result<Self, ValidationReport> {
        let report = schema.validate(draft);
        if !report.is_valid() {
            return Err(report);
        }
        Ok(Self::Cancel {
            cancellation_reason: draft.text("cancellationReason").trim().to_string(),
        })
    }
}

/// A patient's validated appointment request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentRequest {
    pub primary_physician: String,
    pub schedule: NaiveDateTime,
    pub reason: String,
    pub note: Option<String>,
}

impl AppointmentRequest {
    /// Validate a request draft.
    ///
    /// # Errors
    /// Returns the validation report if any field is invalid.
    pub fn from_draft(schema: &Schema, draft: &Draft) -> Result<Self, ValidationReport> {
        let report = schema.validate(draft);
        if !report.is_valid() {
            return Err(report);
        }
        Ok(Self {
            primary_physician: draft.text("primaryPhysician").to_string(),
            schedule: parse_schedule(draft, report)?,
            reason: draft.text("reason").trim().to_string(),
            note: draft.optional_text("note"),
        })
    }

    #[must_use]
    pub fn into_payload(self, user_id: &str, patient_id: &str) -> AppointmentPayload {
        AppointmentPayload {
            user_id: user_id.to_string(),
            patient_id: patient_id.to_string(),
            primary_physician: self.primary_physician,
            schedule: self.schedule,
            reason: self.reason,
            note: self.note,
            status: AppointmentStatus::Pending,
        }
    }
}

fn parse_schedule(
    draft: &Draft,
    mut report: ValidationReport,
) -> Result<NaiveDateTime, ValidationReport> {
    NaiveDateTime::parse_from_str(draft.text("schedule").trim(), DATE_TIME_FORMAT).map_err(|_| {
        report.insert(
            "schedule",
            FieldError::InvalidDate {
                label: "Expected appointment date",
                format: "YYYY-MM-DD HH:MM",
            },
        );
        report
    })
}

fn physician_field() -> FieldSpec {
    FieldSpec::new(
        "primaryPhysician",
        "Doctor",
        FieldKind::Select {
            options: doctor_names(),
        },
    )
    .message("Select at least one doctor")
}

fn schedule_field() -> FieldSpec {
    FieldSpec::new("schedule", "Expected appointment date", FieldKind::DateTime)
        .placeholder("YYYY-MM-DD HH:MM")
}

/// Schema of the patient's new-appointment form.
#[must_use]
pub fn request_schema() -> Schema {
    Schema::define(vec![
        physician_field(),
        schedule_field(),
        FieldSpec::new("reason", "Reason for appointment", FieldKind::Text { min: 2, max: 500 })
            .placeholder("Annual monthly check-up"),
        FieldSpec::new("note", "Comments/notes", FieldKind::TextArea { max: 500 })
            .optional()
            .placeholder("Prefer afternoon appointments, if possible"),
    ])
    .expect("request schema is well-formed")
}

/// Schema of the administrator's schedule form.
#[must_use]
pub fn schedule_schema() -> Schema {
    Schema::define(vec![
        physician_field(),
        schedule_field(),
        FieldSpec::new("reason", "Reason for appointment", FieldKind::TextArea { max: 500 })
            .optional(),
        FieldSpec::new("note", "Comments/notes", FieldKind::TextArea { max: 500 }).optional(),
    ])
    .expect("schedule schema is well-formed")
}

/// Schema of the administrator's cancel form.
#[must_use]
pub fn cancel_schema() -> Schema {
    Schema::define(vec![FieldSpec::new(
        "cancellationReason",
        "Reason for cancellation",
        FieldKind::Text { min: 2, max: 500 },
    )
    .placeholder("Urgent meeting came up")])
    .expect("cancel schema is well-formed")
}

/// A draft for the schedule form, seeded from the existing appointment.
#[must_use]
pub fn schedule_draft(appointment: &Appointment) -> Draft {
    schedule_schema()
        .draft()
        .with("primaryPhysician", appointment.primary_physician.as_str())
        .with(
            "schedule",
            appointment.schedule.format(DATE_TIME_FORMAT).to_string(),
        )
        .with("reason", appointment.reason.as_str())
        .with("note", appointment.note.clone().unwrap_or_default())
}

/// Status counts shown on the admin dashboard.
///
/// The counts cover every stored appointment; `appointments` holds only the
/// most recent page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentSummary {
    pub scheduled: usize,
    pub pending: usize,
    pub cancelled: usize,
    /// Most recent first
    pub appointments: Vec<Appointment>,
}

impl AppointmentSummary {
    #[must_use]
    pub fn new(
        counts: impl IntoIterator<Item = (AppointmentStatus, usize)>,
        appointments: Vec<Appointment>,
    ) -> Self {
        let mut summary = Self {
            appointments,
            ..Self::default()
        };
        for (status, count) in counts {
            match status {
                AppointmentStatus::Scheduled => summary.scheduled += count,
                AppointmentStatus::Pending => summary.pending += count,
                AppointmentStatus::Cancelled => summary.cancelled += count,
            }
        }
        summary
    }

    /// All appointments counted, not just the listed ones.
    #[must_use]
    pub fn total(&self) -> usize {
        self.scheduled + self.pending + self.cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn appointment(status: AppointmentStatus) -> Appointment {
        Appointment {
            id: "a1".to_string(),
            user_id: "u1".to_string(),
            patient_id: "p1".to_string(),
            primary_physician: "John Green".to_string(),
            schedule: NaiveDateTime::parse_from_str("2025-01-15 10:30", DATE_TIME_FORMAT)
                .expect("valid"),
            reason: "Check-up".to_string(),
            note: None,
            status,
            cancellation_reason: None,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_request_from_draft() {
        let schema = request_schema();
        let draft = schema
            .draft()
            .with("primaryPhysician", "John Green")
            .with("schedule", "2025-01-15 10:30")
            .with("reason", "Annual check-up");
        let request = AppointmentRequest::from_draft(&schema, &draft).expect("valid");
        let payload = request.into_payload("u1", "p1");
        assert_eq!(payload.status, AppointmentStatus::Pending);
        assert_eq!(payload.schedule.format("%H:%M").to_string(), "10:30");
        assert!(payload.note.is_none());
    }

    #[test]
    fn test_request_requires_doctor() {
        let schema = request_schema();
        let draft = schema
            .draft()
            .with("schedule", "2025-01-15 10:30")
            .with("reason", "Annual check-up");
        let report = AppointmentRequest::from_draft(&schema, &draft).unwrap_err();
        assert_eq!(report.messages()["primaryPhysician"], "Select at least one doctor");
    }

    #[test]
    fn test_cancel_requires_reason() {
        let schema = cancel_schema();
        assert!(AppointmentUpdate::cancel_from_draft(&schema, &schema.draft()).is_err());
        let draft = schema.draft().with("cancellationReason", "Doctor unavailable");
        let update = AppointmentUpdate::cancel_from_draft(&schema, &draft).expect("valid");
        assert_eq!(update.status(), AppointmentStatus::Cancelled);
    }

    #[test]
    fn test_schedule_draft_roundtrips_existing() {
        let existing = appointment(AppointmentStatus::Pending);
        let draft = schedule_draft(&existing);
        let update =
            AppointmentUpdate::schedule_from_draft(&schedule_schema(), &draft).expect("valid");
        match update {
            AppointmentUpdate::Schedule { schedule, reason, .. } => {
                assert_eq!(schedule, existing.schedule);
                assert_eq!(reason.as_deref(), Some("Check-up"));
            }
            AppointmentUpdate::Cancel { .. } => panic!("expected schedule"),
        }
    }

    #[test]
    fn test_summary_counts() {
        let summary = AppointmentSummary::new(
            [
                (AppointmentStatus::Pending, 150),
                (AppointmentStatus::Scheduled, 1),
                (AppointmentStatus::Cancelled, 1),
            ],
            vec![appointment(AppointmentStatus::Pending)],
        );
        assert_eq!(
            (summary.pending, summary.scheduled, summary.cancelled),
            (150, 1, 1)
        );
        assert_eq!(summary.total(), 152);
        assert_eq!(summary.appointments.len(), 1);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("Scheduled".parse::<AppointmentStatus>(), Ok(AppointmentStatus::Scheduled));
        assert!("done".parse::<AppointmentStatus>().is_err());
    }
}
