//! Patient registration: form schema, typed registration and storage payload.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::doctor::doctor_names;
use super::schema::{
    Draft, FieldError, FieldKind, FieldSpec, FileRef, Schema, ValidationReport, DATE_FORMAT,
};
use super::user::User;

pub const SECTION_PERSONAL: &str = "Personal Information";
pub const SECTION_MEDICAL: &str = "Medical Information";
pub const SECTION_IDENTIFICATION: &str = "Identification and Verification";
pub const SECTION_CONSENT: &str = "Consent and Privacy";

pub const GENDER_OPTIONS: [&str; 3] = ["Male", "Female", "Other"];

pub const IDENTIFICATION_TYPES: [&str; 11] = [
    "Birth Certificate",
    "Driver's License",
    "Medical Insurance Card/Policy",
    "Military ID Card",
    "National Identity Card",
    "Passport",
    "Resident Alien Card (Green Card)",
    "Social Security Card",
    "State ID Card",
    "Student ID Card",
    "Voter ID Card",
];

/// Consent flags that must all be set before a registration is accepted.
pub const CONSENT_FIELDS: [&str; 3] = ["treatmentConsent", "disclosureConsent", "privacyConsent"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Other => "Other",
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Male" => Ok(Self::Male),
            "Female" => Ok(Self::Female),
            "Other" => Ok(Self::Other),
            other => Err(format!("Unknown gender: {other}")),
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema of the patient registration form.
#[must_use]
pub fn registration_schema() -> Schema {
    let text = |min, max| FieldKind::Text { min, max };
    let fields = vec![
        // Personal
        FieldSpec::new("name", "Full Name", text(2, 50))
            .section(SECTION_PERSONAL)
            .placeholder("John Doe"),
        FieldSpec::new("email", "Email", FieldKind::Email)
            .section(SECTION_PERSONAL)
            .placeholder("johndoe@gmail.com"),
        FieldSpec::new("phone", "Phone Number", FieldKind::Phone)
            .section(SECTION_PERSONAL)
            .placeholder("+61412345678"),
        FieldSpec::new("birthDate", "Date of Birth", FieldKind::Date)
            .section(SECTION_PERSONAL)
            .placeholder("YYYY-MM-DD"),
        FieldSpec::new(
            "gender",
            "Gender",
            FieldKind::Select {
                options: GENDER_OPTIONS.to_vec(),
            },
        )
        .section(SECTION_PERSONAL)
        .default_value("Male"),
        FieldSpec::new("address", "Address", text(5, 500))
            .section(SECTION_PERSONAL)
            .placeholder("7th Avenue, New York"),
        FieldSpec::new("occupation", "Occupation", text(2, 500))
            .section(SECTION_PERSONAL)
            .placeholder("Software Engineer"),
        FieldSpec::new("emergencyContactName", "Emergency Contact Name", text(2, 50))
            .section(SECTION_PERSONAL)
            .placeholder("Guardian's name"),
        FieldSpec::new(
            "emergencyContactNumber",
            "Emergency Contact Phone Number",
            FieldKind::Phone,
        )
        .section(SECTION_PERSONAL)
        .placeholder("+61412345678"),
        // Medical
        FieldSpec::new(
            "primaryPhysician",
            "Primary Physician",
            FieldKind::Select {
                options: doctor_names(),
            },
        )
        .section(SECTION_MEDICAL)
        .message("Select at least one doctor"),
        FieldSpec::new("insuranceProvider", "Insurance Provider", text(2, 50))
            .section(SECTION_MEDICAL)
            .placeholder("Bupa, Medibank, Allianz"),
        FieldSpec::new("insurancePolicyNumber", "Insurance Policy Number", text(2, 50))
            .section(SECTION_MEDICAL)
            .placeholder("ABC123456789"),
        FieldSpec::new("allergies", "Allergies (if any)", FieldKind::TextArea { max: 500 })
            .section(SECTION_MEDICAL)
            .optional()
            .placeholder("Peanuts, Penicillin, Pollen"),
        FieldSpec::new(
            "currentMedication",
            "Current Medication (if any)",
            FieldKind::TextArea { max: 500 },
        )
        .section(SECTION_MEDICAL)
        .optional()
        .placeholder("Paracetamol 500mg"),
        FieldSpec::new(
            "familyMedicalHistory",
            "Family Medical History",
            FieldKind::TextArea { max: 500 },
        )
        .section(SECTION_MEDICAL)
        .optional(),
        FieldSpec::new(
            "pastMedicalHistory",
            "Past Medical History",
            FieldKind::TextArea { max: 500 },
        )
        .section(SECTION_MEDICAL)
        .optional(),
        // Identification
        FieldSpec::new(
            "identificationType",
            "Identification Type",
            FieldKind::Select {
                options: IDENTIFICATION_TYPES.to_vec(),
            },
        )
        .section(SECTION_IDENTIFICATION)
        .optional()
        .default_value("Birth Certificate"),
        FieldSpec::new("identificationNumber", "Identification Number", text(0, 50))
            .section(SECTION_IDENTIFICATION)
            .optional()
            .placeholder("123456789"),
        FieldSpec::new(
            "identificationDocument",
            "Copy of Identification Document",
            FieldKind::File { max_files: 1 },
        )
        .section(SECTION_IDENTIFICATION)
        .optional()
        .placeholder("path to a scan or photo"),
        // Consent
        FieldSpec::new(
            "treatmentConsent",
            "I consent to treatment",
            FieldKind::Checkbox {
                must_be_checked: true,
            },
        )
        .section(SECTION_CONSENT)
        .message("You must consent to treatment in order to proceed"),
        FieldSpec::new(
            "disclosureConsent",
            "I consent to disclosure of information",
            FieldKind::Checkbox {
                must_be_checked: true,
            },
        )
        .section(SECTION_CONSENT)
        .message("You must consent to disclosure in order to proceed"),
        FieldSpec::new(
            "privacyConsent",
            "I consent to the privacy policy",
            FieldKind::Checkbox {
                must_be_checked: true,
            },
        )
        .section(SECTION_CONSENT)
        .message("You must consent to privacy in order to proceed"),
    ];
    Schema::define(fields).expect("registration schema is well-formed")
}

/// A fresh registration draft prefilled from a known user.
#[must_use]
pub fn registration_draft(schema: &Schema, user: &User, today: NaiveDate) -> Draft {
    schema
        .draft()
        .with("name", user.name.as_str())
        .with("email", user.email.as_str())
        .with("phone", user.phone.as_str())
        .with("birthDate", today.format(DATE_FORMAT).to_string())
}

/// A validated patient registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientRegistration {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: NaiveDate,
    pub gender: Gender,
    pub address: String,
    pub occupation: String,
    pub emergency_contact_name: String,
    pub emergency_contact_number: String,
    pub primary_physician: String,
    pub insurance_provider: String,
    pub insurance_policy_number: String,
    pub allergies: Option<String>,
    pub current_medication: Option<String>,
    pub family_medical_history: Option<String>,
    pub past_medical_history: Option<String>,
    pub identification_type: Option<String>,
    pub identification_number: Option<String>,
    pub identification_document: Option<FileRef>,
    pub treatment_consent: bool,
    pub disclosure_consent: bool,
    pub privacy_consent: bool,
}

impl PatientRegistration {
    /// Validate a draft against `schema` and convert it.
    ///
    /// # Errors
    /// Returns the validation report if any field is invalid.
    pub fn from_draft(schema: &Schema, draft: &Draft) -> Result<Self, ValidationReport> {
        let mut report = schema.validate(draft);
        if !report.is_valid() {
            return Err(report);
        }

        let birth_date = NaiveDate::parse_from_str(draft.text("birthDate").trim(), DATE_FORMAT);
        let gender = draft.text("gender").parse::<Gender>();
        let (birth_date, gender) = match (birth_date, gender) {
            (Ok(b), Ok(g)) => (b, g),
            (b, g) => {
                if b.is_err() {
                    report.insert(
                        "birthDate",
                        FieldError::InvalidDate {
                            label: "Date of Birth",
                            format: "YYYY-MM-DD",
                        },
                    );
                }
                if g.is_err() {
                    report.insert("gender", FieldError::UnknownOption { label: "Gender" });
                }
                return Err(report);
            }
        };

        let documents = draft.files("identificationDocument");
        if documents.len() > 1 {
            report.insert("identificationDocument", FieldError::TooManyFiles { max: 1 });
            return Err(report);
        }

        Ok(Self {
            name: draft.text("name").trim().to_string(),
            email: draft.text("email").trim().to_lowercase(),
            phone: draft.text("phone").trim().to_string(),
            birth_date,
            gender,
            address: draft.text("address").trim().to_string(),
            occupation: draft.text("occupation").trim().to_string(),
            emergency_contact_name: draft.text("emergencyContactName").trim().to_string(),
            emergency_contact_number: draft.text("emergencyContactNumber").trim().to_string(),
            primary_physician: draft.text("primaryPhysician").to_string(),
            insurance_provider: draft.text("insuranceProvider").trim().to_string(),
            insurance_policy_number: draft.text("insurancePolicyNumber").trim().to_string(),
            allergies: draft.optional_text("allergies"),
            current_medication: draft.optional_text("currentMedication"),
            family_medical_history: draft.optional_text("familyMedicalHistory"),
            past_medical_history: draft.optional_text("pastMedicalHistory"),
            identification_type: draft.optional_text("identificationType"),
            identification_number: draft.optional_text("identificationNumber"),
            identification_document: documents.first().cloned(),
            treatment_consent: draft.flag("treatmentConsent"),
            disclosure_consent: draft.flag("disclosureConsent"),
            privacy_consent: draft.flag("privacyConsent"),
        })
    }

    /// Reshape into the storage payload.
    ///
    /// The document itself is uploaded separately; only its stored id and URL
    /// travel with the patient record.
    #[must_use]
    pub fn into_payload(self, user_id: &str, document: Option<&StoredFile>) -> PatientPayload {
        PatientPayload {
            user_id: user_id.to_string(),
            name: self.name,
            email: self.email,
            phone: self.phone,
            birth_date: self.birth_date,
            gender: self.gender,
            address: self.address,
            occupation: self.occupation,
            emergency_contact_name: self.emergency_contact_name,
            emergency_contact_number: self.emergency_contact_number,
            primary_physician: self.primary_physician,
            insurance_provider: self.insurance_provider,
            insurance_policy_number: self.insurance_policy_number,
            allergies: self.allergies,
            current_medication: self.current_medication,
            family_medical_history: self.family_medical_history,
            past_medical_history: self.past_medical_history,
            identification_type: self.identification_type,
            identification_number: self.identification_number,
            identification_document_id: document.map(|d| d.id.clone()),
            identification_document_url: document.map(|d| d.url.clone()),
            treatment_consent: self.treatment_consent,
            disclosure_consent: self.disclosure_consent,
            privacy_consent: self.privacy_consent,
        }
    }
}

/// Binary upload built from a [`FileRef`].
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    /// Read the referenced file into memory.
    ///
    /// # Errors
    /// Returns error if the file cannot be read.
    pub fn read(file: &FileRef) -> std::io::Result<Self> {
        Ok(Self {
            file_name: file.file_name.clone(),
            content_type: file.content_type.clone(),
            bytes: std::fs::read(&file.path)?,
        })
    }
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size_bytes", &self.bytes.len())
            .finish()
    }
}

/// An uploaded document as stored by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub id: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: usize,
    pub url: String,
}

/// Patient record as sent to storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientPayload {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: NaiveDate,
    pub gender: Gender,
    pub address: String,
    pub occupation: String,
    pub emergency_contact_name: String,
    pub emergency_contact_number: String,
    pub primary_physician: String,
    pub insurance_provider: String,
    pub insurance_policy_number: String,
    pub allergies: Option<String>,
    pub current_medication: Option<String>,
    pub family_medical_history: Option<String>,
    pub past_medical_history: Option<String>,
    pub identification_type: Option<String>,
    pub identification_number: Option<String>,
    pub identification_document_id: Option<String>,
    pub identification_document_url: Option<String>,
    pub treatment_consent: bool,
    pub disclosure_consent: bool,
    pub privacy_consent: bool,
}

/// A stored patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    #[serde(flatten)]
    pub profile: PatientPayload,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
