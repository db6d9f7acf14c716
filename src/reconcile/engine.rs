//! Reconciliation Engine
//!
//! Merges an external record into a form value map under a workflow
//! schema. Resolution per field goes through the strategy ladder in
//! [`super::matcher`], found values are coerced to the field's type, and
//! choice-field values are canonicalized against the declared options.
//!
//! Reconciliation is idempotent: running it twice over the same inputs
//! produces the same map, and a value already present in the map is
//! never overwritten or downgraded to unset.

use std::collections::BTreeMap;

use log::{debug, info, warn};

use crate::form::value::{coerce_value, FormValue, FormValueMap};
use crate::schema::WorkflowSchema;

use super::matcher::{resolve_field, MatchRule};
use super::record::ExternalRecord;

/// Outcome of canonicalizing a value against a closed options list.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionMatch {
    /// The value equals an option exactly
    Exact(String),
    /// Matched after trimming/case-folding; carries the canonical casing
    Canonicalized(String),
    /// Matched by bidirectional substring; carries the canonical option
    Fuzzy(String),
    /// No option matched; the raw value is retained but flagged
    Unmatched(String),
}

/// Report of one reconciliation pass.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    /// Fields that received a value, with the strategy that found it
    pub resolved: BTreeMap<String, MatchRule>,
    /// Choice fields whose resolved value matched none of the options;
    /// the caller should render these unset rather than accept the value
    pub unmatched_options: Vec<String>,
}

impl Reconciliation {
    /// Returns true when nothing was resolved.
    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty() && self.unmatched_options.is_empty()
    }
}

/// Merges `record` into `values` under `schema`.
///
/// Already-set non-blank values are preserved; each remaining field is
/// resolved independently with its own step context.
pub fn reconcile(
    schema: &WorkflowSchema,
    record: &ExternalRecord,
    values: &mut FormValueMap,
) -> Reconciliation {
    let mut report = Reconciliation::default();

    for step in &schema.steps {
        for field in &step.fields {
            // Explicitly-set values always win over recomputed ones
            if !values.is_blank(&field.id) {
                debug!("Field '{}' already set, skipping", field.id);
                continue;
            }

            let (raw, rule) = match resolve_field(field, step, record) {
                Some(hit) => hit,
                None => continue,
            };

            let mut value = coerce_value(field.field_type, raw);

            if field.field_type.is_choice() {
                if let FormValue::Text(text) = &value {
                    match canonicalize_option(text, &field.options) {
                        OptionMatch::Exact(v)
                        | OptionMatch::Canonicalized(v)
                        | OptionMatch::Fuzzy(v) => value = FormValue::Text(v),
                        OptionMatch::Unmatched(v) => {
                            warn!(
                                "Field '{}': value '{}' matches no declared option",
                                field.id, v
                            );
                            report.unmatched_options.push(field.id.clone());
                            continue;
                        }
                    }
                } else if let FormValue::Items(items) = &value {
                    let (canonical, any_unmatched) = canonicalize_items(items, &field.options);
                    if any_unmatched {
                        warn!(
                            "Field '{}': some values match no declared option",
                            field.id
                        );
                        report.unmatched_options.push(field.id.clone());
                    }
                    value = FormValue::Items(canonical);
                }
            }

            if value.is_blank() {
                continue;
            }

            if values.set_if_absent(&field.id, value) {
                report.resolved.insert(field.id.clone(), rule);
            }
        }
    }

    info!(
        "Reconciliation resolved {} fields ({} unmatched options)",
        report.resolved.len(),
        report.unmatched_options.len()
    );

    report
}

/// Re-runs resolution for country-labelled fields only.
///
/// The repair pass of an edit session: after the initial reconciliation
/// settles, verify that country-like fields ended up populated and give
/// the fallback one more chance for those that did not. No new data is
/// fetched; only the already-loaded record is consulted.
pub fn repair_country_fields(
    schema: &WorkflowSchema,
    record: &ExternalRecord,
    values: &mut FormValueMap,
) -> Vec<String> {
    let mut repaired = Vec::new();

    for step in &schema.steps {
        for field in &step.fields {
            if !field.label.to_lowercase().contains("country") {
                continue;
            }
            if !values.is_blank(&field.id) {
                continue;
            }

            if let Some((raw, _)) = resolve_field(field, step, record) {
                let value = coerce_value(field.field_type, raw);
                if !value.is_blank() && values.set_if_absent(&field.id, value) {
                    info!("Repair pass populated '{}'", field.id);
                    repaired.push(field.id.clone());
                }
            }
        }
    }

    repaired
}

/// Canonicalizes a resolved value against a field's options list.
///
/// Tries, in order: exact match; case-insensitive trimmed match
/// (replacing the value with the exactly-cased option); bidirectional
/// substring match. An unmatched value is retained but flagged so the
/// control renders empty instead of silently accepting an invalid
/// option.
pub fn canonicalize_option(value: &str, options: &[String]) -> OptionMatch {
    if options.iter().any(|o| o == value) {
        return OptionMatch::Exact(value.to_string());
    }

    let folded = value.trim().to_lowercase();
    if let Some(option) = options.iter().find(|o| o.trim().to_lowercase() == folded) {
        return OptionMatch::Canonicalized(option.clone());
    }

    if !folded.is_empty() {
        if let Some(option) = options.iter().find(|o| {
            let of = o.trim().to_lowercase();
            of.contains(&folded) || folded.contains(&of)
        }) {
            return OptionMatch::Fuzzy(option.clone());
        }
    }

    OptionMatch::Unmatched(value.to_string())
}

/// Applies [`canonicalize_option`] to every item of a multi-value field,
/// dropping items that match nothing.
pub fn canonicalize_items(items: &[String], options: &[String]) -> (Vec<String>, bool) {
    let mut out = Vec::with_capacity(items.len());
    let mut any_unmatched = false;

    for item in items {
        match canonicalize_option(item, options) {
            OptionMatch::Exact(v) | OptionMatch::Canonicalized(v) | OptionMatch::Fuzzy(v) => {
                out.push(v)
            }
            OptionMatch::Unmatched(_) => any_unmatched = true,
        }
    }

    (out, any_unmatched)
}
