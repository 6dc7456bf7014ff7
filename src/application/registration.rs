//! Registration service: sign-up and patient registration submits.

use std::sync::Arc;

use crate::domain::patient::registration_schema;
use crate::domain::{
    sign_up_schema, Attachment, Draft, NewUser, Patient, PatientRegistration, Schema, User,
};
use crate::ports::Persistence;
use crate::CarepulseError;

/// Service that turns validated drafts into stored users and patients.
pub struct RegistrationService<P: Persistence> {
    storage: Arc<P>,
    sign_up: Schema,
    registration: Schema,
}

impl<P> RegistrationService<P>
where
    P: Persistence,
    P::Error: Into<crate::adapters::StorageError>,
{
    pub fn new(storage: Arc<P>) -> Self {
        Self {
            storage,
            sign_up: sign_up_schema(),
            registration: registration_schema(),
        }
    }

    #[must_use]
    pub fn sign_up_schema(&self) -> &Schema {
        &self.sign_up
    }

    #[must_use]
    pub fn registration_schema(&self) -> &Schema {
        &self.registration
    }

    /// Create (or find) the user described by a sign-up draft.
    ///
    /// # Errors
    /// Returns a validation error for an invalid draft, or a storage error.
    pub fn sign_up(&self, draft: &Draft) -> Result<User, CarepulseError> {
        let new_user = NewUser::from_draft(&self.sign_up, draft)?;
        let user = self
            .storage
            .create_user(&new_user)
            .map_err(|e| CarepulseError::Storage(e.into()))?;
        tracing::info!("Signed up user {}", user.id);
        Ok(user)
    }

    /// Validate, upload the identification document (if any) and create the patient.
    ///
    /// The patient is created with exactly one storage call. Nothing is
    /// retried or rolled back: a document uploaded before a failed patient
    /// create stays stored.
    ///
    /// # Errors
    /// Returns a validation error for an invalid draft, an I/O error if the
    /// attachment cannot be read, or a storage error.
    pub fn register_patient(&self, user: &User, draft: &Draft) -> Result<Patient, CarepulseError> {
        let registration = PatientRegistration::from_draft(&self.registration, draft)?;

        let document = match &registration.identification_document {
            Some(file) => {
                let attachment = Attachment::read(file).map_err(|e| {
                    tracing::error!("Failed to read identification document: {}", e);
                    CarepulseError::Io(e)
                })?;
                let stored = self
                    .storage
                    .upload_document(&attachment)
                    .map_err(|e| CarepulseError::Storage(e.into()))?;
                Some(stored)
            }
            None => None,
        };

        let payload = registration.into_payload(&user.id, document.as_ref());
        let patient = self
            .storage
            .create_patient(&payload)
            .map_err(|e| CarepulseError::Storage(e.into()))?;

        tracing::info!("Registered patient {} for user {}", patient.id, user.id);
        Ok(patient)
    }

    /// # Errors
    /// Returns error if storage fails.
    pub fn get_user(&self, id: &str) -> Result<Option<User>, CarepulseError> {
        self.storage
            .get_user(id)
            .map_err(|e| CarepulseError::Storage(e.into()))
    }

    /// Most recent patient record of a user.
    ///
    /// # Errors
    /// Returns error if storage fails.
    pub fn get_patient(&self, user_id: &str) -> Result<Option<Patient>, CarepulseError> {
        self.storage
            .get_patient(user_id)
            .map_err(|e| CarepulseError::Storage(e.into()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::adapters::sqlite::SqliteStorage;
    use crate::adapters::StorageError;
    use crate::domain::patient::tests::complete_draft;
    use crate::domain::{
        Appointment, AppointmentPayload, AppointmentStatus, AppointmentUpdate, FieldValue, FileRef,
        PatientPayload, StoredFile,
    };
    use std::io::Write;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// SQLite storage that counts patient creates and can be told to fail them.
    pub(crate) struct CountingStorage {
        pub(crate) inner: SqliteStorage,
        pub(crate) patient_creates: AtomicUsize,
        pub(crate) uploads: AtomicUsize,
        pub(crate) fail_patients: AtomicBool,
    }

    impl CountingStorage {
        pub(crate) fn new() -> Self {
            Self {
                inner: SqliteStorage::in_memory().expect("Should create db"),
                patient_creates: AtomicUsize::new(0),
                uploads: AtomicUsize::new(0),
                fail_patients: AtomicBool::new(false),
            }
        }
    }

    impl Persistence for CountingStorage {
        type Error = StorageError;

        fn create_user(&self, user: &NewUser) -> Result<User, Self::Error> {
            self.inner.create_user(user)
        }

        fn get_user(&self, id: &str) -> Result<Option<User>, Self::Error> {
            self.inner.get_user(id)
        }

        fn upload_document(&self, attachment: &Attachment) -> Result<StoredFile, Self::Error> {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            self.inner.upload_document(attachment)
        }

        fn create_patient(&self, patient: &PatientPayload) -> Result<Patient, Self::Error> {
            self.patient_creates.fetch_add(1, Ordering::SeqCst);
            if self.fail_patients.load(Ordering::SeqCst) {
                return Err(StorageError::NotFound("backend unavailable".to_string()));
            }
            self.inner.create_patient(patient)
        }

        fn get_patient(&self, user_id: &str) -> Result<Option<Patient>, Self::Error> {
            self.inner.get_patient(user_id)
        }

        fn create_appointment(
            &self,
            appointment: &AppointmentPayload,
        ) -> Result<Appointment, Self::Error> {
            self.inner.create_appointment(appointment)
        }

        fn get_appointment(&self, id: &str) -> Result<Option<Appointment>, Self::Error> {
            self.inner.get_appointment(id)
        }

        fn update_appointment(
            &self,
            id: &str,
            update: &AppointmentUpdate,
        ) -> Result<Appointment, Self::Error> {
            self.inner.update_appointment(id, update)
        }

        fn list_appointments(&self, limit: usize) -> Result<Vec<Appointment>, Self::Error> {
            self.inner.list_appointments(limit)
        }

        fn count_appointments_by_status(
            &self,
        ) -> Result<Vec<(AppointmentStatus, usize)>, Self::Error> {
            self.inner.count_appointments_by_status()
        }
    }

    fn service() -> (RegistrationService<CountingStorage>, Arc<CountingStorage>) {
        let storage = Arc::new(CountingStorage::new());
        (RegistrationService::new(Arc::clone(&storage)), storage)
    }

    fn signed_up(service: &RegistrationService<CountingStorage>) -> User {
        let draft = service
            .sign_up_schema()
            .draft()
            .with("name", "Ada Lovelace")
            .with("email", "ada@example.com")
            .with("phone", "+61412345678");
        service.sign_up(&draft).expect("Should sign up")
    }

    #[test]
    fn test_sign_up_is_idempotent_per_email() {
        let (service, _) = service();
        let first = signed_up(&service);
        let second = signed_up(&service);
        assert_eq!(first.id, second.id);
        assert_eq!(service.get_user(&first.id).expect("load"), Some(first));
    }

    #[test]
    fn test_sign_up_rejects_bad_email() {
        let (service, _) = service();
        let draft = service
            .sign_up_schema()
            .draft()
            .with("name", "Ada")
            .with("email", "not-an-email")
            .with("phone", "+61412345678");
        match service.sign_up(&draft) {
            Err(CarepulseError::Validation(report)) => {
                assert_eq!(report.fields().collect::<Vec<_>>(), vec!["email"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_registration_creates_once() {
        let (service, storage) = service();
        let user = signed_up(&service);
        let draft = complete_draft(service.registration_schema());

        let patient = service.register_patient(&user, &draft).expect("Should register");
        assert_eq!(storage.patient_creates.load(Ordering::SeqCst), 1);
        assert_eq!(storage.uploads.load(Ordering::SeqCst), 0);
        assert_eq!(patient.profile.user_id, user.id);

        let loaded = service
            .get_patient(&user.id)
            .expect("load")
            .expect("exists");
        assert_eq!(loaded.id, patient.id);
    }

    #[test]
    fn test_missing_consent_never_reaches_storage() {
        let (service, storage) = service();
        let user = signed_up(&service);
        let draft = complete_draft(service.registration_schema()).with("privacyConsent", false);

        let result = service.register_patient(&user, &draft);
        assert!(matches!(result, Err(CarepulseError::Validation(_))));
        assert_eq!(storage.patient_creates.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_document_uploaded_and_linked() {
        let (service, storage) = service();
        let user = signed_up(&service);

        let mut file = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .expect("tempfile");
        file.write_all(b"\x89PNG fake").expect("write");

        let draft = complete_draft(service.registration_schema()).with(
            "identificationDocument",
            FieldValue::Files(vec![FileRef::from_path(file.path())]),
        );
        let patient = service.register_patient(&user, &draft).expect("Should register");

        assert_eq!(storage.uploads.load(Ordering::SeqCst), 1);
        let url = patient
            .profile
            .identification_document_url
            .expect("document url");
        let id = patient
            .profile
            .identification_document_id
            .expect("document id");
        assert!(url.ends_with(&id));
    }

    #[test]
    fn test_missing_document_is_io_error() {
        let (service, storage) = service();
        let user = signed_up(&service);
        let draft = complete_draft(service.registration_schema()).with(
            "identificationDocument",
            FieldValue::Files(vec![FileRef::from_path("/nonexistent/carepulse/id.png")]),
        );
        assert!(matches!(
            service.register_patient(&user, &draft),
            Err(CarepulseError::Io(_))
        ));
        assert_eq!(storage.patient_creates.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_storage_failure_surfaces_once() {
        let (service, storage) = service();
        let user = signed_up(&service);
        storage.fail_patients.store(true, Ordering::SeqCst);

        let draft = complete_draft(service.registration_schema());
        assert!(matches!(
            service.register_patient(&user, &draft),
            Err(CarepulseError::Storage(_))
        ));
        assert_eq!(storage.patient_creates.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_second_submit_duplicates() {
        let (service, storage) = service();
        let user = signed_up(&service);
        let draft = complete_draft(service.registration_schema());
        let first = service.register_patient(&user, &draft).expect("first");
        let second = service.register_patient(&user, &draft).expect("second");
        assert_ne!(first.id, second.id);
        assert_eq!(storage.patient_creates.load(Ordering::SeqCst), 2);
    }
}
