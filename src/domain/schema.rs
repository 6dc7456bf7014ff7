//! Declarative form schemas.
//!
//! A [`Schema`] is an ordered list of [`FieldSpec`]s. Each spec carries a
//! [`FieldKind`], and each kind owns the predicate used to check a value of
//! that kind. Validation walks every spec against a [`Draft`] and collects the
//! failures into a [`ValidationReport`].

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use zeroize::Zeroize;

/// Input format for date fields.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Input format for date-time fields.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

static EMAIL_PATTERN: OnceLock<Regex> = OnceLock::new();
static PHONE_PATTERN: OnceLock<Regex> = OnceLock::new();

fn email_pattern() -> &'static Regex {
    EMAIL_PATTERN.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Valid regex"))
}

// International format: leading '+' then 10 to 15 digits (e.g. +61412345678).
fn phone_pattern() -> &'static Regex {
    PHONE_PATTERN.get_or_init(|| Regex::new(r"^\+\d{10,15}$").expect("Valid regex"))
}

/// Errors raised while defining a schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("Duplicate field name: {0}")]
    DuplicateField(&'static str),

    #[error("Field {0} has no selectable options")]
    NoOptions(&'static str),

    #[error("Field {0} has an invalid length range")]
    InvalidRange(&'static str),
}

/// A single field's validation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("{label} is required")]
    Required { label: &'static str },

    #[error("{label} must be at least {min} characters")]
    TooShort { label: &'static str, min: usize },

    #[error("{label} must be at most {max} characters")]
    TooLong { label: &'static str, max: usize },

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Invalid phone number")]
    InvalidPhone,

    #[error("{label} must be a valid date ({format})")]
    InvalidDate {
        label: &'static str,
        format: &'static str,
    },

    #[error("{label} must be one of the listed options")]
    UnknownOption { label: &'static str },

    #[error("{label} must be checked")]
    Unchecked { label: &'static str },

    #[error("At most {max} file(s) may be attached")]
    TooManyFiles { max: usize },

    #[error("{label} has the wrong kind of value")]
    WrongType { label: &'static str },

    #[error("{0}")]
    Custom(&'static str),
}

/// Reference to a local file chosen for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub path: PathBuf,
    pub file_name: String,
    pub content_type: String,
}

impl FileRef {
    /// Build a reference from a path, inferring name and content type.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content_type = content_type_for(&path).to_string();
        Self {
            path,
            file_name,
            content_type,
        }
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// A value held by a draft field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Bool(bool),
    Files(Vec<FileRef>),
}

impl FieldValue {
    /// Whether the value counts as "not provided".
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::Bool(_) => false,
            Self::Files(files) => files.is_empty(),
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_files(&self) -> Option<&[FileRef]> {
        match self {
            Self::Files(files) => Some(files),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Semantic kind of a field. Each variant owns its validation predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Single-line text with a character-count range.
    Text { min: usize, max: usize },
    Email,
    Phone,
    /// Calendar date in [`DATE_FORMAT`].
    Date,
    /// Date and time in [`DATE_TIME_FORMAT`].
    DateTime,
    /// One of a fixed list of options.
    Select { options: Vec<&'static str> },
    /// Multi-line free text.
    TextArea { max: usize },
    Checkbox { must_be_checked: bool },
    File { max_files: usize },
}

impl FieldKind {
    /// Check a provided (non-empty) value against this kind.
    ///
    /// # Errors
    /// Returns the first constraint the value violates.
    pub fn check(&self, label: &'static str, value: &FieldValue) -> Result<(), FieldError> {
        match self {
            Self::Text { min, max } => {
                let text = value.as_text().ok_or(FieldError::WrongType { label })?;
                let len = text.chars().count();
                if len < *min {
                    return Err(FieldError::TooShort { label, min: *min });
                }
                if len > *max {
                    return Err(FieldError::TooLong { label, max: *max });
                }
                Ok(())
            }
            Self::Email => {
                let text = value.as_text().ok_or(FieldError::WrongType { label })?;
                if email_pattern().is_match(text.trim()) {
                    Ok(())
                } else {
                    Err(FieldError::InvalidEmail)
                }
            }
            Self::Phone => {
                let text = value.as_text().ok_or(FieldError::WrongType { label })?;
                if phone_pattern().is_match(text.trim()) {
                    Ok(())
                } else {
                    Err(FieldError::InvalidPhone)
                }
            }
            Self::Date => {
                let text = value.as_text().ok_or(FieldError::WrongType { label })?;
                NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
                    .map(|_| ())
                    .map_err(|_| FieldError::InvalidDate {
                        label,
                        format: "YYYY-MM-DD",
                    })
            }
            Self::DateTime => {
                let text = value.as_text().ok_or(FieldError::WrongType { label })?;
                NaiveDateTime::parse_from_str(text.trim(), DATE_TIME_FORMAT)
                    .map(|_| ())
                    .map_err(|_| FieldError::InvalidDate {
                        label,
                        format: "YYYY-MM-DD HH:MM",
                    })
            }
            Self::Select { options } => {
                let text = value.as_text().ok_or(FieldError::WrongType { label })?;
                if options.iter().any(|o| *o == text) {
                    Ok(())
                } else {
                    Err(FieldError::UnknownOption { label })
                }
            }
            Self::TextArea { max } => {
                let text = value.as_text().ok_or(FieldError::WrongType { label })?;
                if text.chars().count() > *max {
                    Err(FieldError::TooLong { label, max: *max })
                } else {
                    Ok(())
                }
            }
            Self::Checkbox { must_be_checked } => {
                let checked = value.as_bool().ok_or(FieldError::WrongType { label })?;
                if *must_be_checked && !checked {
                    Err(FieldError::Unchecked { label })
                } else {
                    Ok(())
                }
            }
            Self::File { max_files } => {
                let files = value.as_files().ok_or(FieldError::WrongType { label })?;
                if files.len() > *max_files {
                    Err(FieldError::TooManyFiles { max: *max_files })
                } else {
                    Ok(())
                }
            }
        }
    }

    /// The value an untouched field of this kind starts with.
    #[must_use]
    pub fn empty_value(&self) -> FieldValue {
        match self {
            Self::Checkbox { .. } => FieldValue::Bool(false),
            Self::File { .. } => FieldValue::Files(Vec::new()),
            _ => FieldValue::Text(String::new()),
        }
    }

    /// Whether the field is edited by typing characters.
    #[must_use]
    pub fn is_typed(&self) -> bool {
        !matches!(self, Self::Checkbox { .. } | Self::Select { .. })
    }
}

/// Declaration of one form field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub section: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub default: Option<FieldValue>,
    /// Replaces any error this field reports.
    pub message: Option<&'static str>,
    pub placeholder: &'static str,
}

impl FieldSpec {
    /// A required field with no default.
    pub fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            section: "",
            kind,
            required: true,
            default: None,
            message: None,
            placeholder: "",
        }
    }

    #[must_use]
    pub fn section(mut self, section: &'static str) -> Self {
        self.section = section;
        self
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<FieldValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    #[must_use]
    pub fn message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }

    #[must_use]
    pub fn placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Validate one value against this spec.
    ///
    /// # Errors
    /// Returns the error to display next to the field.
    pub fn validate(&self, value: Option<&FieldValue>) -> Result<(), FieldError> {
        let result = match value {
            Some(v) if !v.is_empty() => self.kind.check(self.label, v),
            _ if self.required => Err(FieldError::Required { label: self.label }),
            _ => Ok(()),
        };
        result.map_err(|e| match self.message {
            Some(message) => FieldError::Custom(message),
            None => e,
        })
    }
}

/// In-progress form data keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    values: BTreeMap<String, FieldValue>,
}

impl Draft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) {
        self.values.insert(name.to_string(), value.into());
    }

    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Text of a field, or `""` when missing or not text.
    #[must_use]
    pub fn text(&self, name: &str) -> &str {
        self.get(name).and_then(FieldValue::as_text).unwrap_or("")
    }

    /// Trimmed text, or `None` when blank.
    #[must_use]
    pub fn optional_text(&self, name: &str) -> Option<String> {
        let text = self.text(name).trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    #[must_use]
    pub fn flag(&self, name: &str) -> bool {
        self.get(name).and_then(FieldValue::as_bool).unwrap_or(false)
    }

    #[must_use]
    pub fn files(&self, name: &str) -> &[FileRef] {
        self.get(name).and_then(FieldValue::as_files).unwrap_or(&[])
    }

    /// Mutable text buffer of a field, if it holds text.
    pub fn text_mut(&mut self, name: &str) -> Option<&mut String> {
        match self.values.get_mut(name) {
            Some(FieldValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Zero every text buffer, then drop all values.
    pub fn wipe(&mut self) {
        for value in self.values.values_mut() {
            if let FieldValue::Text(text) = value {
                text.zeroize();
            }
        }
        self.values.clear();
    }
}

/// Outcome of validating a draft.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: BTreeMap<&'static str, FieldError>,
}

impl ValidationReport {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn error(&self, field: &str) -> Option<&FieldError> {
        self.errors.get(field)
    }

    /// Names of the failing fields.
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.errors.keys().copied()
    }

    /// Field name to display message.
    #[must_use]
    pub fn messages(&self) -> BTreeMap<&'static str, String> {
        self.errors
            .iter()
            .map(|(name, err)| (*name, err.to_string()))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn insert(&mut self, field: &'static str, error: FieldError) {
        self.errors.insert(field, error);
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|(name, err)| format!("{name}: {err}"))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// An ordered, validated collection of field specs.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// Build a schema from field specs.
    ///
    /// # Errors
    /// Returns error on duplicate names, empty option lists or inverted ranges.
    pub fn define(fields: Vec<FieldSpec>) -> Result<Self, SchemaError> {
        let mut seen = BTreeSet::new();
        for spec in &fields {
            if !seen.insert(spec.name) {
                return Err(SchemaError::DuplicateField(spec.name));
            }
            match &spec.kind {
                FieldKind::Select { options } if options.is_empty() => {
                    return Err(SchemaError::NoOptions(spec.name));
                }
                FieldKind::Text { min, max } if min > max => {
                    return Err(SchemaError::InvalidRange(spec.name));
                }
                _ => {}
            }
        }
        Ok(Self { fields })
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// A draft holding every field's default (or empty) value.
    #[must_use]
    pub fn draft(&self) -> Draft {
        let mut draft = Draft::new();
        for spec in &self.fields {
            let value = spec
                .default
                .clone()
                .unwrap_or_else(|| spec.kind.empty_value());
            draft.set(spec.name, value);
        }
        draft
    }

    /// Validate every field of `draft`.
    #[must_use]
    pub fn validate(&self, draft: &Draft) -> ValidationReport {
        let mut report = ValidationReport::default();
        for spec in &self.fields {
            if let Err(e) = spec.validate(draft.get(spec.name)) {
                report.insert(spec.name, e);
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact_schema() -> Schema {
        Schema::define(vec![
            FieldSpec::new("name", "Name", FieldKind::Text { min: 2, max: 50 }),
            FieldSpec::new("email", "Email", FieldKind::Email),
            FieldSpec::new("phone", "Phone", FieldKind::Phone),
            FieldSpec::new("notes", "Notes", FieldKind::TextArea { max: 10 }).optional(),
            FieldSpec::new("agree", "Agree", FieldKind::Checkbox { must_be_checked: true })
                .message("You must agree"),
        ])
        .expect("valid schema")
    }

    fn valid_draft() -> Draft {
        Draft::new()
            .with("name", "Ada Lovelace")
            .with("email", "ada@example.com")
            .with("phone", "+61412345678")
            .with("agree", true)
    }

    #[test]
    fn test_valid_draft_has_no_errors() {
        let report = contact_schema().validate(&valid_draft());
        assert!(report.is_valid(), "{report}");
    }

    #[test]
    fn test_missing_required_field() {
        let draft = valid_draft().with("name", "");
        let report = contact_schema().validate(&draft);
        assert!(!report.is_valid());
        assert_eq!(report.fields().collect::<Vec<_>>(), vec!["name"]);
        assert_eq!(
            report.error("name"),
            Some(&FieldError::Required { label: "Name" })
        );
    }

    #[test]
    fn test_bad_email_and_phone() {
        let draft = valid_draft()
            .with("email", "ada@example")
            .with("phone", "0412 345 678");
        let report = contact_schema().validate(&draft);
        assert_eq!(report.error("email"), Some(&FieldError::InvalidEmail));
        assert_eq!(report.error("phone"), Some(&FieldError::InvalidPhone));
        assert_eq!(report.len(), 2);
    }

    #[test]
    fn test_custom_message_replaces_error() {
        let draft = valid_draft().with("agree", false);
        let report = contact_schema().validate(&draft);
        assert_eq!(report.messages()["agree"], "You must agree");
    }

    #[test]
    fn test_optional_empty_is_skipped_but_checked_when_present() {
        let schema = contact_schema();
        assert!(schema.validate(&valid_draft().with("notes", "")).is_valid());
        let report = schema.validate(&valid_draft().with("notes", "far too long for this"));
        assert_eq!(
            report.error("notes"),
            Some(&FieldError::TooLong { label: "Notes", max: 10 })
        );
    }

    #[test]
    fn test_wrong_value_type() {
        let report = contact_schema().validate(&valid_draft().with("name", true));
        assert_eq!(report.error("name"), Some(&FieldError::WrongType { label: "Name" }));
    }

    #[test]
    fn test_length_counts_chars() {
        let kind = FieldKind::Text { min: 2, max: 3 };
        assert!(kind.check("X", &FieldValue::from("éé")).is_ok());
        assert!(kind.check("X", &FieldValue::from("é")).is_err());
    }

    #[test]
    fn test_dates() {
        assert!(FieldKind::Date.check("D", &"1990-02-28".into()).is_ok());
        assert!(FieldKind::Date.check("D", &"1990-02-30".into()).is_err());
        assert!(FieldKind::DateTime.check("D", &"2025-03-01 09:30".into()).is_ok());
        assert!(FieldKind::DateTime.check("D", &"2025-03-01".into()).is_err());
    }

    #[test]
    fn test_select_and_files() {
        let select = FieldKind::Select {
            options: vec!["Male", "Female"],
        };
        assert!(select.check("G", &"Female".into()).is_ok());
        assert!(select.check("G", &"female".into()).is_err());

        let file = FieldKind::File { max_files: 1 };
        let one = FieldValue::Files(vec![FileRef::from_path("/tmp/id.png")]);
        let two = FieldValue::Files(vec![
            FileRef::from_path("/tmp/a.png"),
            FileRef::from_path("/tmp/b.png"),
        ]);
        assert!(file.check("Doc", &one).is_ok());
        assert_eq!(
            file.check("Doc", &two),
            Err(FieldError::TooManyFiles { max: 1 })
        );
    }

    #[test]
    fn test_file_ref_infers_metadata() {
        let file = FileRef::from_path("/scans/Passport.JPG");
        assert_eq!(file.file_name, "Passport.JPG");
        assert_eq!(file.content_type, "image/jpeg");
    }

    #[test]
    fn test_define_rejects_bad_schemas() {
        let dup = Schema::define(vec![
            FieldSpec::new("a", "A", FieldKind::Email),
            FieldSpec::new("a", "A", FieldKind::Phone),
        ]);
        assert_eq!(dup.unwrap_err(), SchemaError::DuplicateField("a"));

        let no_options = Schema::define(vec![FieldSpec::new(
            "s",
            "S",
            FieldKind::Select { options: vec![] },
        )]);
        assert_eq!(no_options.unwrap_err(), SchemaError::NoOptions("s"));
    }

    #[test]
    fn test_draft_uses_defaults() {
        let schema = Schema::define(vec![
            FieldSpec::new("g", "G", FieldKind::Select { options: vec!["Other"] })
                .default_value("Other"),
            FieldSpec::new("c", "C", FieldKind::Checkbox { must_be_checked: false }),
        ])
        .expect("valid schema");
        let draft = schema.draft();
        assert_eq!(draft.text("g"), "Other");
        assert!(!draft.flag("c"));
    }
}
