//! External Records
//!
//! A backend record arrives as loosely-shaped JSON: either a flat
//! key/value bag, a `{steps: [{name, fields: [...]}]}` nested structure,
//! or both at once. This module provides uniform views over both shapes
//! so the matcher never touches raw JSON paths.

use serde_json::Value;

/// Administrative keys in the flat bag that never correspond to form
/// fields and must be skipped during matching.
const ADMIN_KEYS: &[&str] = &[
    "id",
    "created_at",
    "updated_at",
    "created_by",
    "updated_by",
    "steps",
];

/// One field entry from the nested `steps[].fields[]` shape.
#[derive(Debug, Clone)]
pub struct RecordField<'a> {
    /// Name of the step the field was found under, if present
    pub step_name: Option<&'a str>,
    /// The field's `name` member
    pub name: Option<&'a str>,
    /// The field's `field_id` member
    pub field_id: Option<&'a str>,
    /// The field's `label` member
    pub label: Option<&'a str>,
    /// The raw value
    pub value: &'a Value,
}

/// A backend-owned record wrapped for reconciliation.
#[derive(Debug, Clone)]
pub struct ExternalRecord {
    raw: Value,
}

impl ExternalRecord {
    /// Wraps a raw JSON record.
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }

    /// Returns the underlying JSON.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Iterates field entries from the nested `steps[].fields[]` shape.
    ///
    /// Missing or oddly-typed members are tolerated; entries without a
    /// usable value are still yielded so the matcher can decide.
    pub fn nested_fields(&self) -> Vec<RecordField<'_>> {
        let mut out = Vec::new();

        let steps = match self.raw.get("steps").and_then(Value::as_array) {
            Some(steps) => steps,
            None => return out,
        };

        for step in steps {
            let step_name = step.get("name").and_then(Value::as_str);
            let fields = match step.get("fields").and_then(Value::as_array) {
                Some(fields) => fields,
                None => continue,
            };

            for field in fields {
                out.push(RecordField {
                    step_name,
                    name: field.get("name").and_then(Value::as_str),
                    field_id: field.get("field_id").and_then(Value::as_str),
                    label: field.get("label").and_then(Value::as_str),
                    value: field.get("value").unwrap_or(&Value::Null),
                });
            }
        }

        out
    }

    /// Returns true when the record carries the nested steps shape.
    pub fn has_nested_steps(&self) -> bool {
        self.raw
            .get("steps")
            .and_then(Value::as_array)
            .map(|s| !s.is_empty())
            .unwrap_or(false)
    }

    /// Iterates the flat top-level bag, skipping administrative keys.
    pub fn flat_entries(&self) -> Vec<(&str, &Value)> {
        let map = match self.raw.as_object() {
            Some(map) => map,
            None => return Vec::new(),
        };

        map.iter()
            .filter(|(key, _)| !is_admin_key(key))
            .map(|(key, value)| (key.as_str(), value))
            .collect()
    }

    /// Raw access to a flat key, admin keys included.
    ///
    /// Used by the country fallback, which probes literal keys.
    pub fn flat_get(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }
}

/// Returns true for keys that never name a form field: `id`, `*_id`,
/// audit timestamps/users, and the nested `steps` member itself.
fn is_admin_key(key: &str) -> bool {
    ADMIN_KEYS.contains(&key) || key.ends_with("_id")
}

/// Returns true when a raw JSON value counts as empty for matching:
/// null, empty/whitespace string, or empty array.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn nested_record() -> ExternalRecord {
        ExternalRecord::new(json!({
            "id": "rec-1",
            "created_at": "2026-01-01T00:00:00Z",
            "workflow_id": "wf-1",
            "company_name": "Acme GmbH",
            "steps": [
                {
                    "name": "General Information",
                    "fields": [
                        {"name": "company_name", "field_id": "company_name",
                         "label": "Company Name", "value": "Acme GmbH"},
                        {"name": "legal_form", "value": "GmbH"}
                    ]
                },
                {
                    "name": "Addresses",
                    "fields": [
                        {"name": "address_country", "label": "Country", "value": "Germany"}
                    ]
                }
            ]
        }))
    }

    #[test]
    fn test_nested_fields_extraction() {
        let record = nested_record();
        let fields = record.nested_fields();

        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].step_name, Some("General Information"));
        assert_eq!(fields[0].field_id, Some("company_name"));
        assert_eq!(fields[1].field_id, None);
        assert_eq!(fields[2].name, Some("address_country"));
        assert_eq!(fields[2].value, &json!("Germany"));
    }

    #[test]
    fn test_nested_fields_absent() {
        let record = ExternalRecord::new(json!({"company_name": "Acme"}));
        assert!(record.nested_fields().is_empty());
        assert!(!record.has_nested_steps());
    }

    #[test]
    fn test_nested_fields_tolerates_malformed_steps() {
        let record = ExternalRecord::new(json!({
            "steps": [
                {"name": "No fields member"},
                {"fields": "not an array"},
                {"fields": [{"name": "ok", "value": 1}]}
            ]
        }));

        let fields = record.nested_fields();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, Some("ok"));
        assert_eq!(fields[0].step_name, None);
    }

    #[test]
    fn test_flat_entries_skip_admin_keys() {
        let record = nested_record();
        let keys: Vec<&str> = record.flat_entries().iter().map(|(k, _)| *k).collect();

        assert!(keys.contains(&"company_name"));
        assert!(!keys.contains(&"id"));
        assert!(!keys.contains(&"workflow_id"));
        assert!(!keys.contains(&"created_at"));
        assert!(!keys.contains(&"steps"));
    }

    #[test]
    fn test_flat_get_reaches_admin_keys() {
        let record = nested_record();
        assert_eq!(record.flat_get("id"), Some(&json!("rec-1")));
    }

    #[test]
    fn test_flat_entries_on_non_object() {
        let record = ExternalRecord::new(json!(["not", "an", "object"]));
        assert!(record.flat_entries().is_empty());
    }

    #[test]
    fn test_is_empty_value() {
        assert!(is_empty_value(&Value::Null));
        assert!(is_empty_value(&json!("")));
        assert!(is_empty_value(&json!("   ")));
        assert!(is_empty_value(&json!([])));
        assert!(!is_empty_value(&json!("x")));
        assert!(!is_empty_value(&json!(0)));
        assert!(!is_empty_value(&json!(false)));
    }
}
