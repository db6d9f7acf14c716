//! Stepped Wizard Controller
//!
//! Drives a user through a schema's steps with per-step validation
//! gating. Tracks which steps have been validated and completed, keeps
//! local and server-reported field errors in separate maps (so a user
//! edit can optimistically clear only the matching server error), and
//! auto-navigates to the first step carrying a server error.

use std::collections::{BTreeMap, HashSet};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::reconcile::match_server_field;
use crate::schema::WorkflowSchema;

use super::rules::validate_step;
use super::value::{FormValue, FormValueMap};

/// A per-field error reported by the remote validation endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RemoteFieldError {
    pub field_name: String,
    #[serde(default)]
    pub field_label: String,
    pub error_message: String,
}

/// Wizard state for one form session.
///
/// # Example
///
/// ```
/// use formflow::form::Wizard;
/// use formflow::form::value::FormValue;
/// use formflow::schema::{Field, FieldType, Step, WorkflowSchema};
///
/// let schema = WorkflowSchema::from_steps(
///     "Onboarding",
///     vec![Step::new("general", "General")
///         .with_field(Field::new("name", FieldType::Text, "Name").required())],
/// );
/// let mut wizard = Wizard::new(schema);
/// wizard.set_value("name", FormValue::Text("Acme".into()));
/// assert!(wizard.validate_current_step());
/// assert!(wizard.can_submit());
/// ```
pub struct Wizard {
    schema: WorkflowSchema,
    values: FormValueMap,
    current_step: usize,
    validated_steps: HashSet<String>,
    completed_steps: HashSet<String>,
    local_errors: BTreeMap<String, String>,
    server_errors: BTreeMap<String, String>,
}

impl Wizard {
    /// Creates a wizard positioned on the first step with empty values.
    pub fn new(schema: WorkflowSchema) -> Self {
        Self::with_values(schema, FormValueMap::new())
    }

    /// Creates a wizard over pre-populated values (edit mode).
    pub fn with_values(schema: WorkflowSchema, values: FormValueMap) -> Self {
        Self {
            schema,
            values,
            current_step: 0,
            validated_steps: HashSet::new(),
            completed_steps: HashSet::new(),
            local_errors: BTreeMap::new(),
            server_errors: BTreeMap::new(),
        }
    }

    /// The schema driving this wizard.
    pub fn schema(&self) -> &WorkflowSchema {
        &self.schema
    }

    /// The current value map.
    pub fn values(&self) -> &FormValueMap {
        &self.values
    }

    /// Mutable access for reconciliation passes.
    pub fn values_mut(&mut self) -> &mut FormValueMap {
        &mut self.values
    }

    /// Current 0-based step index.
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// Sets a field value.
    ///
    /// Clears that field's local error and optimistically clears its
    /// server error, so an edit never leaves a stale message pinned to
    /// the field while revalidation is pending.
    pub fn set_value(&mut self, field_id: &str, value: FormValue) {
        self.values.set(field_id, value);
        self.local_errors.remove(field_id);

        if self.server_errors.remove(field_id).is_some() {
            debug!("Cleared server error for edited field '{}'", field_id);
        }

        // Editing invalidates the owning step's validated status
        if let Some((step, _)) = self.schema.find_field(field_id) {
            let step_id = step.id.clone();
            self.validated_steps.remove(&step_id);
        }
    }

    /// Validates the current step, recording per-field errors.
    ///
    /// On success the step is marked validated and completed.
    pub fn validate_current_step(&mut self) -> bool {
        let step = match self.schema.steps.get(self.current_step) {
            Some(step) => step,
            None => return false,
        };

        let issues = validate_step(step, &self.values);

        // Replace this step's local errors wholesale
        let field_ids: HashSet<&str> = step.fields.iter().map(|f| f.id.as_str()).collect();
        self.local_errors
            .retain(|field_id, _| !field_ids.contains(field_id.as_str()));

        if issues.is_empty() {
            let step_id = step.id.clone();
            info!("Step '{}' validated", step_id);
            self.validated_steps.insert(step_id.clone());
            self.completed_steps.insert(step_id);
            true
        } else {
            for issue in issues {
                self.local_errors.insert(issue.field_id, issue.message);
            }
            false
        }
    }

    /// Advances to the next step; blocked unless the current step
    /// passes validation.
    pub fn next(&mut self) -> bool {
        if !self.validate_current_step() {
            warn!("Step advance blocked by validation errors");
            return false;
        }

        if self.current_step + 1 < self.schema.steps.len() {
            self.current_step += 1;
            true
        } else {
            false
        }
    }

    /// Steps back; never blocked.
    pub fn back(&mut self) -> bool {
        if self.current_step > 0 {
            self.current_step -= 1;
            true
        } else {
            false
        }
    }

    /// Jumps directly to a step index (bounded).
    pub fn goto(&mut self, index: usize) {
        self.current_step = index.min(self.schema.steps.len().saturating_sub(1));
    }

    /// Returns true when every step has been validated at least once
    /// and no server errors are outstanding.
    pub fn can_submit(&self) -> bool {
        self.schema
            .steps
            .iter()
            .all(|step| self.validated_steps.contains(&step.id))
            && self.server_errors.is_empty()
    }

    /// Maps remote validation errors onto schema fields and navigates
    /// to the first step containing one.
    ///
    /// Returns the index navigated to, or `None` when no error could be
    /// matched to a field (unmatchable errors are logged and dropped).
    pub fn apply_server_errors(&mut self, errors: &[RemoteFieldError]) -> Option<usize> {
        for error in errors {
            match match_server_field(&self.schema, &error.field_name, &error.field_label) {
                Some(field_id) => {
                    info!(
                        "Server error for '{}' mapped to field '{}'",
                        error.field_name, field_id
                    );
                    self.server_errors
                        .insert(field_id, error.error_message.clone());
                }
                None => {
                    warn!(
                        "Server error for '{}' matched no schema field",
                        error.field_name
                    );
                }
            }
        }

        let first = self.first_error_step()?;
        self.current_step = first;
        Some(first)
    }

    /// Index of the first step containing any local or server error.
    pub fn first_error_step(&self) -> Option<usize> {
        self.schema.steps.iter().position(|step| {
            step.fields.iter().any(|f| {
                self.local_errors.contains_key(&f.id) || self.server_errors.contains_key(&f.id)
            })
        })
    }

    /// All errors (local and server) for the fields of a step index.
    pub fn errors_for_step(&self, index: usize) -> Vec<(&str, &str)> {
        let step = match self.schema.steps.get(index) {
            Some(step) => step,
            None => return Vec::new(),
        };

        step.fields
            .iter()
            .filter_map(|f| {
                self.local_errors
                    .get(&f.id)
                    .or_else(|| self.server_errors.get(&f.id))
                    .map(|msg| (f.id.as_str(), msg.as_str()))
            })
            .collect()
    }

    /// The error currently shown for a field, if any.
    pub fn error_for_field(&self, field_id: &str) -> Option<&str> {
        self.local_errors
            .get(field_id)
            .or_else(|| self.server_errors.get(field_id))
            .map(String::as_str)
    }

    /// Returns (validated, total) step counts.
    pub fn progress(&self) -> (usize, usize) {
        (self.validated_steps.len(), self.schema.steps.len())
    }

    /// Whether a step id has been validated.
    pub fn is_validated(&self, step_id: &str) -> bool {
        self.validated_steps.contains(step_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, FieldType, Step};

    fn two_step_wizard() -> Wizard {
        Wizard::new(WorkflowSchema::from_steps(
            "Onboarding",
            vec![
                Step::new("general", "General")
                    .with_field(Field::new("company_name", FieldType::Text, "Company Name").required()),
                Step::new("contact", "Contact")
                    .with_field(Field::new("email", FieldType::Email, "Primary Email").required()),
            ],
        ))
    }

    #[test]
    fn test_advance_blocked_without_required_value() {
        let mut wizard = two_step_wizard();

        assert!(!wizard.next());
        assert_eq!(wizard.current_step(), 0);
        assert!(wizard.error_for_field("company_name").is_some());
    }

    #[test]
    fn test_advance_after_valid_input() {
        let mut wizard = two_step_wizard();
        wizard.set_value("company_name", FormValue::Text("Acme".into()));

        assert!(wizard.next());
        assert_eq!(wizard.current_step(), 1);
        assert!(wizard.is_validated("general"));
    }

    #[test]
    fn test_back_never_blocked() {
        let mut wizard = two_step_wizard();
        wizard.set_value("company_name", FormValue::Text("Acme".into()));
        wizard.next();

        assert!(wizard.back());
        assert_eq!(wizard.current_step(), 0);
        assert!(!wizard.back());
    }

    #[test]
    fn test_cannot_submit_until_all_steps_validated() {
        let mut wizard = two_step_wizard();
        wizard.set_value("company_name", FormValue::Text("Acme".into()));
        wizard.next();

        assert!(!wizard.can_submit());

        wizard.set_value("email", FormValue::Text("a@b.com".into()));
        assert!(wizard.validate_current_step());
        assert!(wizard.can_submit());
    }

    #[test]
    fn test_editing_invalidates_step() {
        let mut wizard = two_step_wizard();
        wizard.set_value("company_name", FormValue::Text("Acme".into()));
        wizard.validate_current_step();
        assert!(wizard.is_validated("general"));

        wizard.set_value("company_name", FormValue::Text("Acme AG".into()));
        assert!(!wizard.is_validated("general"));
    }

    #[test]
    fn test_server_error_navigation() {
        let mut wizard = two_step_wizard();
        wizard.set_value("company_name", FormValue::Text("Acme".into()));
        wizard.next();
        wizard.set_value("email", FormValue::Text("a@b.com".into()));
        wizard.validate_current_step();

        let errors = vec![RemoteFieldError {
            field_name: "company_name".to_string(),
            field_label: "Company Name".to_string(),
            error_message: "Required".to_string(),
        }];

        let navigated = wizard.apply_server_errors(&errors);

        assert_eq!(navigated, Some(0));
        assert_eq!(wizard.current_step(), 0);
        assert_eq!(wizard.error_for_field("company_name"), Some("Required"));
        assert!(!wizard.can_submit());
    }

    #[test]
    fn test_server_error_matched_by_label() {
        let mut wizard = two_step_wizard();

        let errors = vec![RemoteFieldError {
            field_name: "primary_email".to_string(),
            field_label: String::new(),
            error_message: "Already in use".to_string(),
        }];

        let navigated = wizard.apply_server_errors(&errors);

        assert_eq!(navigated, Some(1));
        assert_eq!(wizard.error_for_field("email"), Some("Already in use"));
    }

    #[test]
    fn test_edit_clears_server_error_optimistically() {
        let mut wizard = two_step_wizard();
        wizard.apply_server_errors(&[RemoteFieldError {
            field_name: "company_name".to_string(),
            field_label: String::new(),
            error_message: "Required".to_string(),
        }]);
        assert!(wizard.error_for_field("company_name").is_some());

        wizard.set_value("company_name", FormValue::Text("Acme".into()));

        assert!(wizard.error_for_field("company_name").is_none());
    }

    #[test]
    fn test_unmatchable_server_error_dropped() {
        let mut wizard = two_step_wizard();

        let navigated = wizard.apply_server_errors(&[RemoteFieldError {
            field_name: "mystery_field".to_string(),
            field_label: "Mystery".to_string(),
            error_message: "???".to_string(),
        }]);

        assert!(navigated.is_none());
        assert!(wizard.errors_for_step(0).is_empty());
    }

    #[test]
    fn test_errors_for_step_lists_fields() {
        let mut wizard = two_step_wizard();
        wizard.validate_current_step();

        let errors = wizard.errors_for_step(0);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, "company_name");
    }

    #[test]
    fn test_progress() {
        let mut wizard = two_step_wizard();
        assert_eq!(wizard.progress(), (0, 2));

        wizard.set_value("company_name", FormValue::Text("Acme".into()));
        wizard.validate_current_step();
        assert_eq!(wizard.progress(), (1, 2));
    }

    #[test]
    fn test_goto_bounded() {
        let mut wizard = two_step_wizard();
        wizard.goto(99);
        assert_eq!(wizard.current_step(), 1);
    }

    #[test]
    fn test_revalidation_clears_stale_local_errors() {
        let mut wizard = two_step_wizard();
        wizard.validate_current_step();
        assert!(wizard.error_for_field("company_name").is_some());

        wizard.set_value("company_name", FormValue::Text("Acme".into()));
        assert!(wizard.validate_current_step());
        assert!(wizard.error_for_field("company_name").is_none());
    }
}
