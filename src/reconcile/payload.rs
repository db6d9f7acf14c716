//! Submission Payloads
//!
//! The inverse of reconciliation: flattens a form value map into the
//! key/value payload shape the backend expects. Because the backend's
//! validator may key on either the label-derived snake_case name or the
//! raw field id, every value is written under all of its candidate keys.

use serde_json::{Map, Value};

use crate::form::value::FormValueMap;
use crate::schema::WorkflowSchema;

use super::normalize::{label_key, normalize_key};

/// Builds the flat submission payload for a schema and its values.
///
/// Every field with a non-blank value is written under:
/// 1. the label's normalized snake_case form,
/// 2. the raw field id,
/// 3. the normalized field id, when it differs from the label key.
pub fn build_payload(schema: &WorkflowSchema, values: &FormValueMap) -> Map<String, Value> {
    let mut payload = Map::new();

    for (_, field) in schema.all_fields() {
        let value = match values.get(&field.id) {
            Some(v) if !v.is_blank() => v,
            _ => continue,
        };

        let json = value.to_json();
        let lbl = label_key(&field.label);
        let id_norm = normalize_key(&field.id);

        if !lbl.is_empty() {
            payload.insert(lbl.clone(), json.clone());
        }
        payload.insert(field.id.clone(), json.clone());
        if id_norm != lbl && id_norm != field.id {
            payload.insert(id_norm, json);
        }
    }

    payload
}
