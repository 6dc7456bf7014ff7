//! Form session: a draft being edited against a schema.
//!
//! The session re-validates after every change and once more when the user
//! submits. Errors for a field are only shown after that field was edited
//! or a submit was attempted. While a submission is in flight the session
//! is busy and ignores both edits and further submits.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{Draft, FieldKind, FieldSpec, FieldValue, FileRef, Schema, ValidationReport};

/// Result of pressing submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitAttempt {
    /// A submission is already in flight; nothing happened.
    Busy,
    /// The draft is invalid; errors are now visible.
    Invalid(ValidationReport),
    /// The draft is valid and the session is now busy.
    Ready(Draft),
}

pub struct FormSession {
    schema: Schema,
    draft: Draft,
    report: ValidationReport,
    selected: usize,
    touched: BTreeSet<&'static str>,
    attempted: bool,
    busy: bool,
    submit_error: Option<String>,
    // Typed path for file fields, mirrored into the draft as a FileRef.
    file_inputs: BTreeMap<&'static str, String>,
}

impl FormSession {
    /// Start a session on the schema's default draft.
    #[must_use]
    pub fn new(schema: Schema) -> Self {
        let draft = schema.draft();
        Self::with_draft(schema, draft)
    }

    /// Start a session on a prefilled draft.
    #[must_use]
    pub fn with_draft(schema: Schema, draft: Draft) -> Self {
        let report = schema.validate(&draft);
        Self {
            schema,
            draft,
            report,
            selected: 0,
            touched: BTreeSet::new(),
            attempted: false,
            busy: false,
            submit_error: None,
            file_inputs: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    /// The current validation report (every field, shown or not).
    #[must_use]
    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    #[must_use]
    pub fn selected(&self) -> usize {
        self.selected
    }

    #[must_use]
    pub fn selected_spec(&self) -> Option<&FieldSpec> {
        self.schema.fields().get(self.selected)
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    #[must_use]
    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    /// Error to show next to a field, if it has one and has been touched.
    #[must_use]
    pub fn visible_error(&self, name: &str) -> Option<String> {
        if !self.attempted && !self.touched.contains(name) {
            return None;
        }
        self.report.error(name).map(ToString::to_string)
    }

    /// Text to display for a field.
    #[must_use]
    pub fn display_value(&self, spec: &FieldSpec) -> String {
        match &spec.kind {
            FieldKind::Checkbox { .. } => {
                let mark = if self.draft.flag(spec.name) { "[x]" } else { "[ ]" };
                mark.to_string()
            }
            FieldKind::File { .. } => self
                .file_inputs
                .get(spec.name)
                .cloned()
                .unwrap_or_default(),
            _ => self.draft.text(spec.name).to_string(),
        }
    }

    pub fn next_field(&mut self) {
        let len = self.schema.fields().len();
        if len > 0 {
            self.selected = (self.selected + 1) % len;
        }
    }

    pub fn prev_field(&mut self) {
        let len = self.schema.fields().len();
        if len > 0 {
            self.selected = (self.selected + len - 1) % len;
        }
    }

    /// Type a character into the selected field.
    ///
    /// Space toggles a checkbox; select fields ignore typing.
    pub fn input_char(&mut self, c: char) {
        let Some(spec) = self.editable() else { return };
        let (name, kind) = (spec.name, spec.kind.clone());
        match kind {
            FieldKind::Checkbox { .. } => {
                if c == ' ' {
                    self.toggle();
                }
                return;
            }
            FieldKind::Select { .. } => return,
            FieldKind::File { .. } => {
                self.file_inputs.entry(name).or_default().push(c);
                self.sync_file(name);
            }
            _ => match self.draft.text_mut(name) {
                Some(text) => text.push(c),
                None => self.draft.set(name, c.to_string()),
            },
        }
        self.changed(name);
    }

    /// Remove the last character of the selected field.
    pub fn delete_char(&mut self) {
        let Some(spec) = self.editable() else { return };
        let (name, kind) = (spec.name, spec.kind.clone());
        match kind {
            FieldKind::Checkbox { .. } | FieldKind::Select { .. } => return,
            FieldKind::File { .. } => {
                if let Some(input) = self.file_inputs.get_mut(name) {
                    input.pop();
                }
                self.sync_file(name);
            }
            _ => {
                if let Some(text) = self.draft.text_mut(name) {
                    text.pop();
                }
            }
        }
        self.changed(name);
    }

    /// Reset the selected field to its kind's empty value.
    pub fn clear_field(&mut self) {
        let Some(spec) = self.editable() else { return };
        let (name, empty) = (spec.name, spec.kind.empty_value());
        self.file_inputs.remove(name);
        self.draft.set(name, empty);
        self.changed(name);
    }

    /// Flip the selected checkbox.
    pub fn toggle(&mut self) {
        let Some(spec) = self.editable() else { return };
        if !matches!(spec.kind, FieldKind::Checkbox { .. }) {
            return;
        }
        let name = spec.name;
        let checked = self.draft.flag(name);
        self.draft.set(name, !checked);
        self.changed(name);
    }

    /// Step the selected select field to the next (or previous) option.
    pub fn cycle_option(&mut self, forward: bool) {
        let Some(spec) = self.editable() else { return };
        let FieldKind::Select { options } = &spec.kind else {
            return;
        };
        let name = spec.name;
        let len = options.len();
        let next = match options.iter().position(|o| *o == self.draft.text(name)) {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None if forward => 0,
            None => len - 1,
        };
        let value = options[next];
        self.draft.set(name, value);
        self.changed(name);
    }

    /// Validate once more and, if valid, mark the session busy.
    pub fn begin_submit(&mut self) -> SubmitAttempt {
        if self.busy {
            tracing::debug!("Submit ignored while a submission is in flight");
            return SubmitAttempt::Busy;
        }
        self.attempted = true;
        self.submit_error = None;
        self.report = self.schema.validate(&self.draft);
        if !self.report.is_valid() {
            tracing::debug!("Submit blocked by {} invalid field(s)", self.report.len());
            return SubmitAttempt::Invalid(self.report.clone());
        }
        self.busy = true;
        SubmitAttempt::Ready(self.draft.clone())
    }

    /// The submission failed: keep the draft and show `message`.
    pub fn fail_submit(&mut self, message: impl Into<String>) {
        self.busy = false;
        self.submit_error = Some(message.into());
    }

    /// The submission succeeded: the draft is no longer needed.
    pub fn complete_submit(&mut self) {
        self.busy = false;
        self.clear_sensitive();
    }

    /// Wipe every buffer and return to the schema's defaults.
    pub fn clear_sensitive(&mut self) {
        self.draft.wipe();
        for input in self.file_inputs.values_mut() {
            zeroize::Zeroize::zeroize(input);
        }
        self.file_inputs.clear();
        self.draft = self.schema.draft();
        self.report = self.schema.validate(&self.draft);
        self.touched.clear();
        self.attempted = false;
        self.submit_error = None;
        self.selected = 0;
    }

    fn editable(&self) -> Option<&FieldSpec> {
        if self.busy {
            return None;
        }
        self.selected_spec()
    }

    fn sync_file(&mut self, name: &'static str) {
        let path = self
            .file_inputs
            .get(name)
            .map(|p| p.trim())
            .unwrap_or_default();
        let files = if path.is_empty() {
            Vec::new()
        } else {
            vec![FileRef::from_path(path)]
        };
        self.draft.set(name, FieldValue::Files(files));
    }

    fn changed(&mut self, name: &'static str) {
        self.touched.insert(name);
        self.submit_error = None;
        self.report = self.schema.validate(&self.draft);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::patient::registration_schema;
    use crate::domain::patient::tests::complete_draft;
    use crate::domain::sign_up_schema;

    fn type_text(form: &mut FormSession, text: &str) {
        for c in text.chars() {
            form.input_char(c);
        }
    }

    #[test]
    fn test_errors_hidden_until_touched() {
        let form = FormSession::new(sign_up_schema());
        assert!(!form.report().is_valid());
        assert!(form.visible_error("name").is_none());
    }

    #[test]
    fn test_revalidates_on_every_change() {
        let mut form = FormSession::new(sign_up_schema());
        type_text(&mut form, "A");
        assert_eq!(
            form.visible_error("name").as_deref(),
            Some("Full Name must be at least 2 characters")
        );

        form.input_char('d');
        assert!(form.visible_error("name").is_none());

        form.delete_char();
        assert!(form.visible_error("name").is_some());
        assert!(form.visible_error("email").is_none());
    }

    #[test]
    fn test_submit_blocked_while_invalid() {
        let mut form = FormSession::new(sign_up_schema());
        let attempt = form.begin_submit();
        assert!(matches!(attempt, SubmitAttempt::Invalid(ref r) if r.len() == 3));
        assert!(!form.is_busy());
        assert!(form.visible_error("email").is_some());
    }

    #[test]
    fn test_busy_ignores_second_submit_and_edits() {
        let schema = registration_schema();
        let draft = complete_draft(&schema);
        let mut form = FormSession::with_draft(schema, draft.clone());

        assert_eq!(form.begin_submit(), SubmitAttempt::Ready(draft.clone()));
        assert_eq!(form.begin_submit(), SubmitAttempt::Busy);

        form.input_char('x');
        assert_eq!(form.draft(), &draft);
    }

    #[test]
    fn test_failure_keeps_draft() {
        let schema = registration_schema();
        let draft = complete_draft(&schema);
        let mut form = FormSession::with_draft(schema, draft.clone());

        let _ = form.begin_submit();
        form.fail_submit("Something went wrong");
        assert!(!form.is_busy());
        assert_eq!(form.submit_error(), Some("Something went wrong"));
        assert_eq!(form.draft(), &draft);
        assert!(matches!(form.begin_submit(), SubmitAttempt::Ready(_)));
    }

    #[test]
    fn test_success_discards_draft() {
        let schema = registration_schema();
        let draft = complete_draft(&schema);
        let mut form = FormSession::with_draft(schema.clone(), draft);

        let _ = form.begin_submit();
        form.complete_submit();
        assert_eq!(form.draft(), &schema.draft());
        assert!(!form.is_busy());
    }

    #[test]
    fn test_select_and_checkbox_editing() {
        let schema = registration_schema();
        let gender = schema
            .fields()
            .iter()
            .position(|f| f.name == "gender")
            .expect("gender field");
        let consent = schema
            .fields()
            .iter()
            .position(|f| f.name == "privacyConsent")
            .expect("consent field");
        let mut form = FormSession::new(schema);

        while form.selected() != gender {
            form.next_field();
        }
        form.input_char('z');
        assert_eq!(form.draft().text("gender"), "Male");
        form.cycle_option(true);
        assert_eq!(form.draft().text("gender"), "Female");
        form.cycle_option(false);
        form.cycle_option(false);
        assert_eq!(form.draft().text("gender"), "Other");

        while form.selected() != consent {
            form.prev_field();
        }
        form.input_char(' ');
        assert!(form.draft().flag("privacyConsent"));
        form.toggle();
        assert!(!form.draft().flag("privacyConsent"));
        assert!(form.visible_error("privacyConsent").is_some());
    }

    #[test]
    fn test_file_field_typed_as_path() {
        let schema = registration_schema();
        let index = schema
            .fields()
            .iter()
            .position(|f| f.name == "identificationDocument")
            .expect("document field");
        let mut form = FormSession::new(schema);
        while form.selected() != index {
            form.next_field();
        }

        type_text(&mut form, "/tmp/id.png");
        let files = form.draft().files("identificationDocument");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name, "id.png");
        assert_eq!(files[0].content_type, "image/png");

        form.clear_field();
        assert!(form.draft().files("identificationDocument").is_empty());
    }
}
