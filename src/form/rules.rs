//! Local Validation Rules
//!
//! Evaluates a step's (or a whole schema's) field values against the
//! declared constraints: required presence, numeric bounds, regex
//! patterns, file-type accept lists, and option membership. These checks
//! run locally and are never sent to the server.

use log::debug;
use regex::Regex;

use crate::schema::{Field, FieldType, Step, WorkflowSchema};

use super::value::{FormValue, FormValueMap};

/// A single validation finding against a field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldIssue {
    pub field_id: String,
    pub message: String,
}

impl FieldIssue {
    fn new(field: &Field, message: impl Into<String>) -> Self {
        Self {
            field_id: field.id.clone(),
            message: message.into(),
        }
    }
}

/// Validates every field of a single step.
pub fn validate_step(step: &Step, values: &FormValueMap) -> Vec<FieldIssue> {
    let mut issues = Vec::new();

    for field in &step.fields {
        issues.extend(validate_field(field, values));
    }

    debug!(
        "Step '{}' validation: {} issue(s)",
        step.id,
        issues.len()
    );

    issues
}

/// Validates every field of every step.
pub fn validate_all(schema: &WorkflowSchema, values: &FormValueMap) -> Vec<FieldIssue> {
    schema
        .steps
        .iter()
        .flat_map(|step| validate_step(step, values))
        .collect()
}

/// Validates one field's current value.
fn validate_field(field: &Field, values: &FormValueMap) -> Vec<FieldIssue> {
    let mut issues = Vec::new();

    if values.is_blank(&field.id) {
        if field.required {
            issues.push(FieldIssue::new(
                field,
                format!("{} is required", field.label),
            ));
        }
        // Nothing else to check against an absent value
        return issues;
    }

    let value = match values.get(&field.id) {
        Some(v) => v,
        None => return issues,
    };

    match value {
        FormValue::Number(n) => {
            if let Some(validation) = &field.validation {
                if let Some(min) = validation.min {
                    if *n < min {
                        issues.push(FieldIssue::new(
                            field,
                            format!("{} must be at least {}", field.label, min),
                        ));
                    }
                }
                if let Some(max) = validation.max {
                    if *n > max {
                        issues.push(FieldIssue::new(
                            field,
                            format!("{} must be at most {}", field.label, max),
                        ));
                    }
                }
            }
        }
        FormValue::Text(text) => {
            issues.extend(validate_text(field, text));
        }
        FormValue::Items(items) => {
            if field.field_type.is_choice() {
                for item in items {
                    if !field.options.iter().any(|o| o == item) {
                        issues.push(FieldIssue::new(
                            field,
                            format!("'{}' is not a valid option for {}", item, field.label),
                        ));
                    }
                }
            }
        }
        FormValue::Flag(_) | FormValue::Range { .. } => {}
    }

    issues
}

/// Text-specific checks: patterns, built-in shapes, accept lists,
/// option membership.
fn validate_text(field: &Field, text: &str) -> Vec<FieldIssue> {
    let mut issues = Vec::new();

    if field.field_type.is_choice() && !field.options.iter().any(|o| o == text) {
        issues.push(FieldIssue::new(
            field,
            format!("'{}' is not a valid option for {}", text, field.label),
        ));
        return issues;
    }

    match field.field_type {
        FieldType::Email => {
            if !email_shape(text) {
                issues.push(FieldIssue::new(
                    field,
                    format!("{} must be a valid email address", field.label),
                ));
            }
        }
        FieldType::Url => {
            if !(text.starts_with("http://") || text.starts_with("https://")) {
                issues.push(FieldIssue::new(
                    field,
                    format!("{} must start with http:// or https://", field.label),
                ));
            }
        }
        FieldType::File => {
            if let Some(validation) = &field.validation {
                if !validation.accept.is_empty() && !accepted_file(text, &validation.accept) {
                    issues.push(FieldIssue::new(
                        field,
                        format!(
                            "{} must be one of: {}",
                            field.label,
                            validation.accept.join(", ")
                        ),
                    ));
                }
            }
        }
        _ => {}
    }

    if let Some(validation) = &field.validation {
        if let Some(pattern) = &validation.pattern {
            // Invalid patterns are rejected at schema validation time;
            // a pattern that fails to compile here is simply skipped
            if let Ok(re) = Regex::new(pattern) {
                if !full_match(&re, text) {
                    issues.push(FieldIssue::new(
                        field,
                        format!("{} does not match the expected format", field.label),
                    ));
                }
            }
        }
    }

    issues
}

fn full_match(re: &Regex, text: &str) -> bool {
    re.find(text)
        .map(|m| m.start() == 0 && m.end() == text.len())
        .unwrap_or(false)
}

fn email_shape(text: &str) -> bool {
    let re = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok();
    re.map(|re| re.is_match(text)).unwrap_or(false)
}

/// Matches a filename against an accept list of extensions
/// (".pdf") or simple type names ("pdf").
fn accepted_file(name: &str, accept: &[String]) -> bool {
    let lower = name.to_lowercase();
    accept.iter().any(|entry| {
        let ext = entry.trim_start_matches('.').to_lowercase();
        lower.ends_with(&format!(".{}", ext))
    })
}
