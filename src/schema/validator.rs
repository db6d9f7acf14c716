//! Schema Validation
//!
//! Provides structural validation for workflow schemas including:
//! - Step and field identifier checks
//! - Field-id uniqueness across steps
//! - Options presence for choice fields
//! - Regex compilation of `pattern` rules
//! - Step order normalization

use std::collections::HashSet;

use log::{debug, info};
use regex::Regex;

use super::model::{Field, WorkflowSchema};

/// Validation error types for user-friendly error messages.
#[derive(Debug, Clone)]
pub enum SchemaError {
    EmptySchema,
    EmptySchemaName,
    EmptyStepId,
    EmptyStepName(String),
    DuplicateStepId(String),
    EmptyFieldId(String),
    EmptyFieldLabel(String),
    DuplicateFieldId(String),
    MissingOptions { step: String, field: String },
    DuplicateOption { field: String, option: String },
    InvalidPattern { field: String, error: String },
    InvalidBounds { field: String },
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySchema => write!(f, "Workflow has no steps"),
            Self::EmptySchemaName => write!(f, "Workflow has an empty name"),
            Self::EmptyStepId => write!(f, "A step has an empty or whitespace-only id"),
            Self::EmptyStepName(id) => write!(f, "Step '{}' has an empty name", id),
            Self::DuplicateStepId(id) => write!(f, "Duplicate step id: '{}'", id),
            Self::EmptyFieldId(step) => {
                write!(f, "Step '{}' contains a field with an empty id", step)
            }
            Self::EmptyFieldLabel(field) => write!(f, "Field '{}' has an empty label", field),
            Self::DuplicateFieldId(id) => {
                write!(f, "Field id '{}' is used by more than one field", id)
            }
            Self::MissingOptions { step, field } => {
                write!(
                    f,
                    "Field '{}' in step '{}' is a choice field but declares no options",
                    field, step
                )
            }
            Self::DuplicateOption { field, option } => {
                write!(f, "Field '{}' declares option '{}' twice", field, option)
            }
            Self::InvalidPattern { field, error } => {
                write!(f, "Field '{}' has an invalid pattern: {}", field, error)
            }
            Self::InvalidBounds { field } => {
                write!(f, "Field '{}' has min greater than max", field)
            }
        }
    }
}

/// Validates a single field's declaration.
fn validate_field(step_id: &str, field: &Field) -> Vec<SchemaError> {
    let mut errors = Vec::new();

    if field.id.trim().is_empty() {
        errors.push(SchemaError::EmptyFieldId(step_id.to_string()));
        return errors; // Can't validate further without an id
    }

    if field.label.trim().is_empty() {
        errors.push(SchemaError::EmptyFieldLabel(field.id.clone()));
    }

    if field.field_type.is_choice() {
        if field.options.is_empty() {
            errors.push(SchemaError::MissingOptions {
                step: step_id.to_string(),
                field: field.id.clone(),
            });
        } else {
            let mut seen = HashSet::new();
            for option in &field.options {
                if !seen.insert(option.as_str()) {
                    errors.push(SchemaError::DuplicateOption {
                        field: field.id.clone(),
                        option: option.clone(),
                    });
                }
            }
        }
    }

    if let Some(validation) = &field.validation {
        if let Some(pattern) = &validation.pattern {
            if let Err(e) = Regex::new(pattern) {
                errors.push(SchemaError::InvalidPattern {
                    field: field.id.clone(),
                    error: e.to_string(),
                });
            }
        }

        if let (Some(min), Some(max)) = (validation.min, validation.max) {
            if min > max {
                errors.push(SchemaError::InvalidBounds {
                    field: field.id.clone(),
                });
            }
        }
    }

    errors
}

/// Validates the entire schema structure.
///
/// Performs the following checks:
/// 1. Schema has a name and at least one step
/// 2. No duplicate step ids
/// 3. All fields have valid declarations
/// 4. Field ids are unique across all steps
///
/// On success, step `order` values are renumbered contiguously from 1.
pub fn validate_schema(schema: &mut WorkflowSchema) -> Result<(), String> {
    info!(
        "Validating workflow '{}' with {} steps",
        schema.name,
        schema.steps.len()
    );

    if schema.name.trim().is_empty() {
        return Err(SchemaError::EmptySchemaName.to_string());
    }

    if schema.steps.is_empty() {
        return Err(SchemaError::EmptySchema.to_string());
    }

    let mut all_errors = Vec::new();

    // Check step ids
    let mut seen_steps: HashSet<String> = HashSet::new();
    for step in &schema.steps {
        if step.id.trim().is_empty() {
            all_errors.push(SchemaError::EmptyStepId);
            continue;
        }
        if step.name.trim().is_empty() {
            all_errors.push(SchemaError::EmptyStepName(step.id.clone()));
        }
        if !seen_steps.insert(step.id.clone()) {
            all_errors.push(SchemaError::DuplicateStepId(step.id.clone()));
        }
    }

    // Validate fields and cross-step field-id uniqueness
    let mut seen_fields: HashSet<String> = HashSet::new();
    for step in &schema.steps {
        for field in &step.fields {
            all_errors.extend(validate_field(&step.id, field));

            if !field.id.trim().is_empty() && !seen_fields.insert(field.id.clone()) {
                all_errors.push(SchemaError::DuplicateFieldId(field.id.clone()));
            }
        }
    }

    if !all_errors.is_empty() {
        let messages: Vec<String> = all_errors.iter().map(|e| e.to_string()).collect();
        return Err(messages.join("\n"));
    }

    // Normalize ordering so downstream code can rely on it
    schema.renumber_steps();

    debug!(
        "Schema order after normalization: {:?}",
        schema.steps.iter().map(|s| s.order).collect::<Vec<_>>()
    );

    info!(
        "Workflow validated: {} steps, {} fields",
        schema.steps.len(),
        schema.all_fields().count()
    );
    Ok(())
}

/// Quick validation that returns a list of error messages.
///
/// Useful for builder-UI validation feedback while a schema is being edited.
pub fn quick_validate(schema: &WorkflowSchema) -> Vec<String> {
    let mut errors = Vec::new();

    if schema.steps.is_empty() {
        errors.push("Workflow has no steps".to_string());
        return errors;
    }

    let mut seen_fields: HashSet<&str> = HashSet::new();

    for step in &schema.steps {
        if step.id.trim().is_empty() {
            errors.push("A step has an empty id".to_string());
        }
        if step.name.trim().is_empty() {
            errors.push(format!("Step '{}': missing name", step.id));
        }

        for field in &step.fields {
            if field.id.trim().is_empty() {
                errors.push(format!("Step '{}': field with empty id", step.id));
                continue;
            }
            if !seen_fields.insert(field.id.as_str()) {
                errors.push(format!("Field id '{}' used more than once", field.id));
            }
            if field.field_type.is_choice() && field.options.is_empty() {
                errors.push(format!("Field '{}': choice field without options", field.id));
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::model::{Field, FieldType, FieldValidation, Step};

    fn valid_schema() -> WorkflowSchema {
        WorkflowSchema::from_steps(
            "Onboarding",
            vec![
                Step::new("general", "General").with_field(Field::new(
                    "company_name",
                    FieldType::Text,
                    "Company Name",
                )),
                Step::new("contact", "Contact").with_field(
                    Field::new("country", FieldType::Select, "Country")
                        .with_options(vec!["Germany".into(), "France".into()]),
                ),
            ],
        )
    }

    #[test]
    fn test_valid_schema() {
        let mut schema = valid_schema();
        assert!(validate_schema(&mut schema).is_ok());
    }

    #[test]
    fn test_empty_schema() {
        let mut schema = WorkflowSchema::new("Empty");
        assert!(validate_schema(&mut schema).is_err());
    }

    #[test]
    fn test_empty_name() {
        let mut schema = valid_schema();
        schema.name = "  ".to_string();
        let result = validate_schema(&mut schema);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("empty name"));
    }

    #[test]
    fn test_duplicate_step_ids() {
        let mut schema = valid_schema();
        schema.steps.push(Step::new("general", "Duplicate"));

        let result = validate_schema(&mut schema);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Duplicate step id"));
    }

    #[test]
    fn test_duplicate_field_ids_across_steps() {
        let mut schema = valid_schema();
        schema.steps[1]
            .fields
            .push(Field::new("company_name", FieldType::Text, "Shadow"));

        let result = validate_schema(&mut schema);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("more than one field"));
    }

    #[test]
    fn test_choice_field_without_options() {
        let mut schema = valid_schema();
        schema.steps[0]
            .fields
            .push(Field::new("status", FieldType::Radio, "Status"));

        let result = validate_schema(&mut schema);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("declares no options"));
    }

    #[test]
    fn test_duplicate_option_values() {
        let mut schema = valid_schema();
        schema.steps[0].fields.push(
            Field::new("tier", FieldType::Select, "Tier")
                .with_options(vec!["Gold".into(), "Gold".into()]),
        );

        let result = validate_schema(&mut schema);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("twice"));
    }

    #[test]
    fn test_invalid_pattern() {
        let mut schema = valid_schema();
        schema.steps[0].fields.push(
            Field::new("vat", FieldType::Text, "VAT Number").with_validation(FieldValidation {
                pattern: Some("[unclosed".to_string()),
                ..Default::default()
            }),
        );

        let result = validate_schema(&mut schema);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("invalid pattern"));
    }

    #[test]
    fn test_min_greater_than_max() {
        let mut schema = valid_schema();
        schema.steps[0].fields.push(
            Field::new("headcount", FieldType::Number, "Headcount").with_validation(
                FieldValidation {
                    min: Some(100.0),
                    max: Some(10.0),
                    ..Default::default()
                },
            ),
        );

        let result = validate_schema(&mut schema);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("min greater than max"));
    }

    #[test]
    fn test_validation_renumbers_order() {
        let mut schema = valid_schema();
        schema.steps[0].order = 7;
        schema.steps[1].order = 3;

        validate_schema(&mut schema).unwrap();

        let orders: Vec<u32> = schema.steps.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![1, 2]);
    }

    #[test]
    fn test_quick_validate_empty() {
        let schema = WorkflowSchema::new("Empty");
        let errors = quick_validate(&schema);

        assert!(!errors.is_empty());
        assert!(errors[0].contains("no steps"));
    }

    #[test]
    fn test_quick_validate_missing_options() {
        let mut schema = valid_schema();
        schema.steps[0]
            .fields
            .push(Field::new("status", FieldType::Combobox, "Status"));

        let errors = quick_validate(&schema);
        assert!(errors.iter().any(|e| e.contains("without options")));
    }

    #[test]
    fn test_quick_validate_clean() {
        let schema = valid_schema();
        assert!(quick_validate(&schema).is_empty());
    }

    #[test]
    fn test_schema_error_display() {
        let err = SchemaError::EmptySchema;
        assert_eq!(err.to_string(), "Workflow has no steps");

        let err = SchemaError::DuplicateFieldId("country".to_string());
        assert!(err.to_string().contains("country"));

        let err = SchemaError::MissingOptions {
            step: "general".to_string(),
            field: "tier".to_string(),
        };
        assert!(err.to_string().contains("tier"));
        assert!(err.to_string().contains("general"));
    }
}
