//! SQLite adapter: Implementation of Persistence.
//!
//! Stands in for the hosted backend. Patients are stored as a JSON document
//! next to indexed `user_id`/`created_at` columns; appointments are stored
//! column by column so the admin dashboard can sort and count them.
//!
//! # Mutex Behavior
//!
//! The database connection is protected by a `Mutex`. A poisoned mutex (from
//! a panic in another thread) surfaces as [`StorageError::LockPoisoned`]
//! rather than a panic.
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::schema::DATE_TIME_FORMAT;
use crate::domain::{
    Appointment, AppointmentPayload, AppointmentStatus, AppointmentUpdate, Attachment, NewUser,
    Patient, PatientPayload, StoredFile, User,
};
use crate::ports::Persistence;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database lock poisoned")]
    LockPoisoned,
}

const APPOINTMENT_COLUMNS: &str = "id, user_id, patient_id, primary_physician, schedule, reason, \
     note, status, cancellation_reason, created_at";

/// SQLite storage adapter.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Create a new SQLite storage with the given database path.
    ///
    /// # Errors
    /// Returns error if database cannot be opened or initialized.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Create an in-memory SQLite database (for testing).
    ///
    /// # Errors
    /// Returns error if database cannot be created.
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> Result<(), StorageError> {
        let conn = self.conn()?;

        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                phone TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                file_name TEXT NOT NULL,
                content_type TEXT NOT NULL,
                size_bytes INTEGER NOT NULL,
                bytes BLOB NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS patients (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                data TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_patients_user
                ON patients(user_id, created_at DESC);

            CREATE TABLE IF NOT EXISTS appointments (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                patient_id TEXT NOT NULL,
                primary_physician TEXT NOT NULL,
                schedule TEXT NOT NULL,
                reason TEXT NOT NULL,
                note TEXT,
                status TEXT NOT NULL,
                cancellation_reason TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_appointments_created
                ON appointments(created_at DESC);
            ",
        )?;

        Ok(())
    }

    /// Current time at the precision stored in the database.
    fn now() -> DateTime<Utc> {
        Utc::now().trunc_subsecs(6)
    }

    fn format_timestamp(at: DateTime<Utc>) -> String {
        at.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn parse_timestamp(s: &str, column: usize) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    column,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })
    }

    fn appointment_from_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
        let schedule_str: String = row.get(4)?;
        let status_str: String = row.get(7)?;
        let created_at_str: String = row.get(9)?;

        let schedule = NaiveDateTime::parse_from_str(&schedule_str, DATE_TIME_FORMAT)
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
            })?;
        let status = status_str.parse::<AppointmentStatus>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, e.into())
        })?;

        Ok(Appointment {
            id: row.get(0)?,
            user_id: row.get(1)?,
            patient_id: row.get(2)?,
            primary_physician: row.get(3)?,
            schedule,
            reason: row.get(5)?,
            note: row.get(6)?,
            status,
            cancellation_reason: row.get(8)?,
            created_at: Self::parse_timestamp(&created_at_str, 9)?,
        })
    }

    fn query_appointment(conn: &Connection, id: &str) -> Result<Option<Appointment>, StorageError> {
        let sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1");
        let appointment = conn
            .query_row(&sql, params![id], Self::appointment_from_row)
            .optional()?;
        Ok(appointment)
    }
}

impl Persistence for SqliteStorage {
    type Error = StorageError;

    fn create_user(&self, user: &NewUser) -> Result<User, Self::Error> {
        let conn = self.conn()?;

        let existing = conn
            .query_row(
                "SELECT id, name, email, phone FROM users WHERE email = ?1",
                params![user.email],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        email: row.get(2)?,
                        phone: row.get(3)?,
                    })
                },
            )
            .optional()?;
        if let Some(existing) = existing {
            tracing::debug!("User {} already exists, reusing", existing.id);
            return Ok(existing);
        }

        let created = User {
            id: new_id(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
        };
        conn.execute(
            "INSERT INTO users (id, name, email, phone, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                created.id,
                created.name,
                created.email,
                created.phone,
                Self::format_timestamp(Self::now()),
            ],
        )?;

        tracing::info!("Created user {}", created.id);
        Ok(created)
    }

    fn get_user(&self, id: &str) -> Result<Option<User>, Self::Error> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT id, name, email, phone FROM users WHERE id = ?1",
                params![id],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        email: row.get(2)?,
                        phone: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    fn upload_document(&self, attachment: &Attachment) -> Result<StoredFile, Self::Error> {
        let conn = self.conn()?;
        let id = new_id();

        conn.execute(
            r"
            INSERT INTO documents (id, file_name, content_type, size_bytes, bytes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
            params![
                id,
                attachment.file_name,
                attachment.content_type,
                attachment.bytes.len() as i64,
                attachment.bytes,
                Self::format_timestamp(Self::now()),
            ],
        )?;

        tracing::debug!("Stored document {} ({} bytes)", id, attachment.bytes.len());
        Ok(StoredFile {
            url: format!("carepulse://documents/{id}"),
            id,
            file_name: attachment.file_name.clone(),
            content_type: attachment.content_type.clone(),
            size_bytes: attachment.bytes.len(),
        })
    }

    fn create_patient(&self, patient: &PatientPayload) -> Result<Patient, Self::Error> {
        let data = serde_json::to_string(patient)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let conn = self.conn()?;
        let id = new_id();
        let created_at = Self::now();

        conn.execute(
            "INSERT INTO patients (id, user_id, data, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![id, patient.user_id, data, Self::format_timestamp(created_at)],
        )?;

        tracing::info!("Created patient {}", id);
        Ok(Patient {
            id,
            profile: patient.clone(),
            created_at,
        })
    }

    fn get_patient(&self, user_id: &str) -> Result<Option<Patient>, Self::Error> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                r"
                SELECT id, data, created_at FROM patients
                WHERE user_id = ?1
                ORDER BY created_at DESC, rowid DESC
                LIMIT 1
                ",
                params![user_id],
                |row| {
                    let id: String = row.get(0)?;
                    let data: String = row.get(1)?;
                    let created_at: String = row.get(2)?;
                    Ok((id, data, Self::parse_timestamp(&created_at, 2)?))
                },
            )
            .optional()?;

        match row {
            Some((id, data, created_at)) => {
                let profile: PatientPayload = serde_json::from_str(&data)
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;
                Ok(Some(Patient {
                    id,
                    profile,
                    created_at,
                }))
            }
            None => Ok(None),
        }
    }

    fn create_appointment(
        &self,
        appointment: &AppointmentPayload,
    ) -> Result<Appointment, Self::Error> {
        let conn = self.conn()?;
        let id = new_id();
        let created_at = Self::now();

        conn.execute(
            r"
            INSERT INTO appointments (
                id, user_id, patient_id, primary_physician, schedule,
                reason, note, status, cancellation_reason, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL, ?9)
            ",
            params![
                id,
                appointment.user_id,
                appointment.patient_id,
                appointment.primary_physician,
                appointment.schedule.format(DATE_TIME_FORMAT).to_string(),
                appointment.reason,
                appointment.note,
                appointment.status.as_str(),
                Self::format_timestamp(created_at),
            ],
        )?;

        tracing::info!("Created appointment {}", id);
        Ok(Appointment {
            id,
            user_id: appointment.user_id.clone(),
            patient_id: appointment.patient_id.clone(),
            primary_physician: appointment.primary_physician.clone(),
            schedule: appointment.schedule,
            reason: appointment.reason.clone(),
            note: appointment.note.clone(),
            status: appointment.status,
            cancellation_reason: None,
            created_at,
        })
    }

    fn get_appointment(&self, id: &str) -> Result<Option<Appointment>, Self::Error> {
        let conn = self.conn()?;
        Self::query_appointment(&conn, id)
    }

    fn update_appointment(
        &self,
        id: &str,
        update: &AppointmentUpdate,
    ) -> Result<Appointment, Self::Error> {
        let conn = self.conn()?;

        let changed = match update {
            AppointmentUpdate::Schedule {
                primary_physician,
                schedule,
                reason,
                note,
            } => conn.execute(
                r"
                UPDATE appointments
                SET primary_physician = ?1,
                    schedule = ?2,
                    reason = COALESCE(?3, reason),
                    note = ?4,
                    status = ?5,
                    cancellation_reason = NULL
                WHERE id = ?6
                ",
                params![
                    primary_physician,
                    schedule.format(DATE_TIME_FORMAT).to_string(),
                    reason,
                    note,
                    update.status().as_str(),
                    id,
                ],
            )?,
            AppointmentUpdate::Cancel {
                cancellation_reason,
            } => conn.execute(
                "UPDATE appointments SET status = ?1, cancellation_reason = ?2 WHERE id = ?3",
                params![update.status().as_str(), cancellation_reason, id],
            )?,
        };

        if changed == 0 {
            return Err(StorageError::NotFound(format!("appointment {id}")));
        }

        tracing::info!("Appointment {} is now {}", id, update.status());
        Self::query_appointment(&conn, id)?
            .ok_or_else(|| StorageError::NotFound(format!("appointment {id}")))
    }

    fn list_appointments(&self, limit: usize) -> Result<Vec<Appointment>, Self::Error> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments \
             ORDER BY created_at DESC, rowid DESC LIMIT ?1"
        );
        let mut stmt = conn.prepare(&sql)?;
        let appointments = stmt
            .query_map(params![limit as i64], Self::appointment_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(appointments)
    }

    fn count_appointments_by_status(
        &self,
    ) -> Result<Vec<(AppointmentStatus, usize)>, Self::Error> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT status, COUNT(*) FROM appointments GROUP BY status")?;
        let counts = stmt
            .query_map([], |row| {
                let status: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                let status = status.parse::<AppointmentStatus>().map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        0,
                        rusqlite::types::Type::Text,
                        e.into(),
                    )
                })?;
                Ok((status, usize::try_from(count).unwrap_or_default()))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(counts)
    }
}

/// Generate a UUID v4 (random) using CSPRNG.
///
/// Uses ChaCha20Rng seeded from OS entropy so identifiers in URLs cannot be
/// predicted from earlier ones.
pub(crate) fn new_id() -> String {
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let bytes: [u8; 16] = rng.gen();

    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        (bytes[6] & 0x0f) | 0x40, bytes[7],
        (bytes[8] & 0x3f) | 0x80, bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Gender;

    fn new_user() -> NewUser {
        NewUser {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: "+61412345678".to_string(),
        }
    }

    fn payload(user_id: &str) -> PatientPayload {
        PatientPayload {
            user_id: user_id.to_string(),
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: "+61412345678".to_string(),
            birth_date: chrono::NaiveDate::from_ymd_opt(1985, 12, 10).expect("valid date"),
            gender: Gender::Female,
            address: "7th Avenue, New York".to_string(),
            occupation: "Mathematician".to_string(),
            emergency_contact_name: "Charles Babbage".to_string(),
            emergency_contact_number: "+61498765432".to_string(),
            primary_physician: "Leila Cameron".to_string(),
            insurance_provider: "Medibank".to_string(),
            insurance_policy_number: "ABC123456789".to_string(),
            allergies: None,
            current_medication: None,
            family_medical_history: None,
            past_medical_history: None,
            identification_type: Some("Passport".to_string()),
            identification_number: None,
            identification_document_id: None,
            identification_document_url: None,
            treatment_consent: true,
            disclosure_consent: true,
            privacy_consent: true,
        }
    }

    fn appointment_payload(user_id: &str, patient_id: &str) -> AppointmentPayload {
        AppointmentPayload {
            user_id: user_id.to_string(),
            patient_id: patient_id.to_string(),
            primary_physician: "John Green".to_string(),
            schedule: NaiveDateTime::parse_from_str("2025-01-15 10:30", DATE_TIME_FORMAT)
                .expect("valid"),
            reason: "Check-up".to_string(),
            note: Some("Mornings".to_string()),
            status: AppointmentStatus::Pending,
        }
    }

    #[test]
    fn test_create_user_reuses_email() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        let first = storage.create_user(&new_user()).expect("Should create");
        let second = storage.create_user(&new_user()).expect("Should reuse");
        assert_eq!(first.id, second.id);

        let loaded = storage.get_user(&first.id).expect("Should load");
        assert_eq!(loaded, Some(first));
        assert!(storage.get_user("missing").expect("Should load").is_none());
    }

    #[test]
    fn test_patient_roundtrip() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        assert!(storage.get_patient("u1").expect("Should load").is_none());

        let created = storage.create_patient(&payload("u1")).expect("Should create");
        let loaded = storage
            .get_patient("u1")
            .expect("Should load")
            .expect("Should exist");
        assert_eq!(loaded.id, created.id);
        assert_eq!(loaded.profile, payload("u1"));
    }

    #[test]
    fn test_upload_document() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        let stored = storage
            .upload_document(&Attachment {
                file_name: "passport.png".to_string(),
                content_type: "image/png".to_string(),
                bytes: vec![0x89, b'P', b'N', b'G'],
            })
            .expect("Should store");
        assert_eq!(stored.size_bytes, 4);
        assert!(stored.url.ends_with(&stored.id));
    }

    #[test]
    fn test_appointment_lifecycle() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        let created = storage
            .create_appointment(&appointment_payload("u1", "p1"))
            .expect("Should create");
        assert_eq!(created.status, AppointmentStatus::Pending);

        let loaded = storage
            .get_appointment(&created.id)
            .expect("Should load")
            .expect("Should exist");
        assert_eq!(loaded.schedule, created.schedule);
        assert_eq!(loaded.note.as_deref(), Some("Mornings"));

        let scheduled = storage
            .update_appointment(
                &created.id,
                &AppointmentUpdate::Schedule {
                    primary_physician: "Jane Powell".to_string(),
                    schedule: created.schedule,
                    reason: None,
                    note: None,
                },
            )
            .expect("Should schedule");
        assert_eq!(scheduled.status, AppointmentStatus::Scheduled);
        assert_eq!(scheduled.primary_physician, "Jane Powell");
        assert_eq!(scheduled.reason, "Check-up");

        let cancelled = storage
            .update_appointment(
                &created.id,
                &AppointmentUpdate::Cancel {
                    cancellation_reason: "Doctor unavailable".to_string(),
                },
            )
            .expect("Should cancel");
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
        assert_eq!(
            cancelled.cancellation_reason.as_deref(),
            Some("Doctor unavailable")
        );
    }

    #[test]
    fn test_update_missing_appointment() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        let result = storage.update_appointment(
            "missing",
            &AppointmentUpdate::Cancel {
                cancellation_reason: "n/a".to_string(),
            },
        );
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_list_most_recent_first() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        let first = storage
            .create_appointment(&appointment_payload("u1", "p1"))
            .expect("Should create");
        let second = storage
            .create_appointment(&appointment_payload("u2", "p2"))
            .expect("Should create");

        let listed = storage.list_appointments(10).expect("Should list");
        assert_eq!(
            listed.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(),
            vec![second.id.as_str(), first.id.as_str()]
        );
        assert_eq!(storage.list_appointments(1).expect("Should list").len(), 1);
    }

    #[test]
    fn test_count_by_status_covers_all_rows() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        assert!(storage
            .count_appointments_by_status()
            .expect("Should count")
            .is_empty());

        for _ in 0..3 {
            storage
                .create_appointment(&appointment_payload("u1", "p1"))
                .expect("Should create");
        }
        let cancelled = storage
            .create_appointment(&appointment_payload("u2", "p2"))
            .expect("Should create");
        storage
            .update_appointment(
                &cancelled.id,
                &AppointmentUpdate::Cancel {
                    cancellation_reason: "Moved away".to_string(),
                },
            )
            .expect("Should cancel");

        let mut counts = storage.count_appointments_by_status().expect("Should count");
        counts.sort_by_key(|(status, _)| status.as_str());
        assert_eq!(
            counts,
            vec![
                (AppointmentStatus::Cancelled, 1),
                (AppointmentStatus::Pending, 3),
            ]
        );
    }

    #[test]
    fn test_corrupt_timestamp_is_an_error() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        let created = storage
            .create_appointment(&appointment_payload("u1", "p1"))
            .expect("Should create");
        storage
            .conn()
            .expect("lock")
            .execute(
                "UPDATE appointments SET created_at = 'yesterday' WHERE id = ?1",
                params![created.id],
            )
            .expect("Should corrupt");

        let result = storage.get_appointment(&created.id);
        assert!(matches!(
            result,
            Err(StorageError::Database(
                rusqlite::Error::FromSqlConversionFailure(9, _, _)
            ))
        ));
    }

    #[test]
    fn test_data_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("carepulse.db");

        let id = {
            let storage = SqliteStorage::new(&path).expect("Should open");
            storage.create_user(&new_user()).expect("Should create").id
        };

        let storage = SqliteStorage::new(&path).expect("Should reopen");
        assert!(storage.get_user(&id).expect("Should load").is_some());
    }

    #[test]
    fn test_id_generation() {
        let id1 = new_id();
        let id2 = new_id();
        assert_ne!(id1, id2);
        assert_eq!(id1.len(), 36);
    }
}
