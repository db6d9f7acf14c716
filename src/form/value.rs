//! Form Values
//!
//! The in-memory value map backing a wizard session: dynamically-typed
//! values keyed by field id, plus the coercion policy that turns raw
//! record values into typed form values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::FieldType;

/// A dynamically-typed form value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum FormValue {
    /// Boolean fields (checkbox, switch)
    Flag(bool),
    /// Numeric fields (number, slider, rating)
    Number(f64),
    /// Multi-value fields (multiselect)
    Items(Vec<String>),
    /// Date-range fields
    Range { start: String, end: String },
    /// Everything else
    Text(String),
}

impl FormValue {
    /// Returns true when this value counts as "no value" for
    /// required-field purposes: empty string, `false`, empty list,
    /// or a range with both ends empty.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::Flag(b) => !b,
            Self::Number(_) => false,
            Self::Items(items) => items.is_empty(),
            Self::Range { start, end } => start.is_empty() && end.is_empty(),
        }
    }

    /// Renders the value as a display string (used by the CLI summary).
    pub fn display(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Flag(b) => b.to_string(),
            Self::Number(n) => format_number(*n),
            Self::Items(items) => items.join(", "),
            Self::Range { start, end } => format!("{} .. {}", start, end),
        }
    }

    /// Converts to the JSON representation used in submission payloads.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(s) => Value::String(s.clone()),
            Self::Flag(b) => Value::Bool(*b),
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(format_number(*n))),
            Self::Items(items) => {
                Value::Array(items.iter().map(|s| Value::String(s.clone())).collect())
            }
            Self::Range { start, end } => serde_json::json!({ "start": start, "end": end }),
        }
    }
}

/// Formats a float without a trailing `.0` for whole numbers.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// A mapping from field id to its current value.
///
/// Absent key means "untouched". Backed by a BTreeMap so iteration order
/// is deterministic across reconciliation runs.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct FormValueMap(BTreeMap<String, FormValue>);

impl FormValueMap {
    /// Creates an empty value map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a value, replacing any existing one.
    pub fn set(&mut self, field_id: impl Into<String>, value: FormValue) {
        self.0.insert(field_id.into(), value);
    }

    /// Sets a value only when the field is currently unset or blank.
    ///
    /// This is the reconciliation rule: an explicitly-set value always
    /// wins over a freshly recomputed one for the same field.
    pub fn set_if_absent(&mut self, field_id: &str, value: FormValue) -> bool {
        if self.is_blank(field_id) {
            self.0.insert(field_id.to_string(), value);
            true
        } else {
            false
        }
    }

    /// Gets the value for a field, if set.
    pub fn get(&self, field_id: &str) -> Option<&FormValue> {
        self.0.get(field_id)
    }

    /// Removes a field's value.
    pub fn remove(&mut self, field_id: &str) -> Option<FormValue> {
        self.0.remove(field_id)
    }

    /// Returns true when the field is unset or holds a blank value.
    pub fn is_blank(&self, field_id: &str) -> bool {
        self.0.get(field_id).map(|v| v.is_blank()).unwrap_or(true)
    }

    /// Iterates (field_id, value) pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FormValue)> {
        self.0.iter()
    }

    /// Returns the number of set fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when no field has been set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Coerces a raw record value into the form value shape for a field type.
///
/// Policy:
/// - boolean fields: truthy strings/numbers/bools → `Flag`; null → `false`
/// - numeric fields: parseable → `Number`; unparseable → empty `Text`
/// - multiselect: arrays and comma-separated strings → `Items`
/// - daterange: `{start, end}` objects → `Range`
/// - everything else → `Text`; null → empty `Text`
pub fn coerce_value(field_type: FieldType, raw: &Value) -> FormValue {
    if field_type.is_boolean() {
        return FormValue::Flag(truthy(raw));
    }

    if field_type.is_numeric() {
        return match parse_number(raw) {
            Some(n) => FormValue::Number(n),
            None => FormValue::Text(String::new()),
        };
    }

    if field_type.is_multi() {
        return FormValue::Items(string_items(raw));
    }

    if field_type == FieldType::DateRange {
        if let Value::Object(map) = raw {
            let start = map.get("start").map(text_of).unwrap_or_default();
            let end = map.get("end").map(text_of).unwrap_or_default();
            return FormValue::Range { start, end };
        }
    }

    FormValue::Text(text_of(raw))
}

fn truthy(raw: &Value) -> bool {
    match raw {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => {
            matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on")
        }
        _ => false,
    }
}

fn parse_number(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn string_items(raw: &Value) -> Vec<String> {
    match raw {
        Value::Array(items) => items.iter().map(text_of).filter(|s| !s.is_empty()).collect(),
        Value::String(s) => s
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn text_of(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
