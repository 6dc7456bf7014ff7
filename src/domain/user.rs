//! Account holders created from the sign-up form.

use serde::{Deserialize, Serialize};

use super::schema::{Draft, FieldKind, FieldSpec, Schema, ValidationReport};

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Sign-up details before an id is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl NewUser {
    /// Validate a sign-up draft and extract the account details.
    ///
    /// # Errors
    /// Returns the validation report if any field is invalid.
    pub fn from_draft(schema: &Schema, draft: &Draft) -> Result<Self, ValidationReport> {
        let report = schema.validate(draft);
        if !report.is_valid() {
            return Err(report);
        }
        Ok(Self {
            name: draft.text("name").trim().to_string(),
            email: draft.text("email").trim().to_lowercase(),
            phone: draft.text("phone").trim().to_string(),
        })
    }
}

/// Schema of the landing-page sign-up form.
#[must_use]
pub fn sign_up_schema() -> Schema {
    let fields = vec![
        FieldSpec::new("name", "Full Name", FieldKind::Text { min: 2, max: 50 })
            .placeholder("John Doe"),
        FieldSpec::new("email", "Email", FieldKind::Email).placeholder("johndoe@gmail.com"),
        FieldSpec::new("phone", "Phone Number", FieldKind::Phone).placeholder("+61412345678"),
    ];
    Schema::define(fields).expect("sign-up schema is well-formed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_draft_normalizes_email() {
        let schema = sign_up_schema();
        let draft = schema
            .draft()
            .with("name", " Ada Lovelace ")
            .with("email", "Ada@Example.com")
            .with("phone", "+61412345678");
        let user = NewUser::from_draft(&schema, &draft).expect("valid");
        assert_eq!(user.name, "Ada Lovelace");
        assert_eq!(user.email, "ada@example.com");
    }

    #[test]
    fn test_from_draft_reports_errors() {
        let schema = sign_up_schema();
        let report = NewUser::from_draft(&schema, &schema.draft()).unwrap_err();
        assert_eq!(report.len(), 3);
    }
}
