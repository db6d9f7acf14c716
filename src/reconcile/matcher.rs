//! Field Matching Strategies
//!
//! Resolves a schema field against an external record by trying a fixed
//! ladder of matching strategies in order, from exact identifier equality
//! down to a domain-specific country fallback. A strategy only wins when
//! it produces a non-empty value; empty hits fall through to the next
//! strategy.

use log::debug;
use serde_json::Value;

use crate::schema::{Field, Step};

use super::normalize::{has_suffix_word, has_word, label_key, normalize_key};
use super::record::{is_empty_value, ExternalRecord};

/// Literal flat-bag keys probed by the country fallback, before
/// step-context reordering.
const COUNTRY_KEYS: &[&str] = &["address_country", "country", "country_name", "country_code"];

/// Which strategy produced a match. Ordered by priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchRule {
    /// Nested `field_id` equals the schema field id
    ExactId,
    /// Normalized nested identifier equals the normalized field id
    NormalizedId,
    /// Nested `name` equals the raw field id
    NameAsId,
    /// Normalized nested `name` equals the normalized label
    LabelExact,
    /// Normalized nested `name` ends with `_<label>` (or equals it)
    LabelSuffix,
    /// Normalized nested `name` contains the label words intact
    LabelWord,
    /// Flat-bag key matched by identifier (normalized or raw)
    FlatId,
    /// Flat-bag key equals the normalized label
    FlatLabelExact,
    /// Flat-bag key ends with `_<label>`
    FlatLabelSuffix,
    /// Flat-bag key contains the label words intact
    FlatLabelWord,
    /// Country-specific literal-key fallback
    CountryFallback,
}

/// Resolves a field's value from an external record.
///
/// Returns the raw (uncoerced) JSON value and the strategy that found
/// it, or `None` when every strategy failed to produce a non-empty hit.
pub fn resolve_field<'a>(
    field: &Field,
    step: &Step,
    record: &'a ExternalRecord,
) -> Option<(&'a Value, MatchRule)> {
    if let Some(hit) = resolve_nested(field, record) {
        return Some(hit);
    }

    if let Some(hit) = resolve_flat(field, record) {
        return Some(hit);
    }

    resolve_country_fallback(field, step, record)
}

/// Strategies 1–6: the nested `steps[].fields[]` shape.
fn resolve_nested<'a>(
    field: &Field,
    record: &'a ExternalRecord,
) -> Option<(&'a Value, MatchRule)> {
    let nested = record.nested_fields();
    if nested.is_empty() {
        return None;
    }

    let id_key = normalize_key(&field.id);
    let lbl_key = label_key(&field.label);

    let hit = find_nested(&nested, |rf| rf.field_id == Some(field.id.as_str()))
        .map(|v| (v, MatchRule::ExactId))
        .or_else(|| {
            find_nested(&nested, |rf| {
                rf.field_id
                    .map(|fid| normalize_key(fid) == id_key)
                    .unwrap_or(false)
            })
            .map(|v| (v, MatchRule::NormalizedId))
        })
        .or_else(|| {
            find_nested(&nested, |rf| rf.name == Some(field.id.as_str()))
                .map(|v| (v, MatchRule::NameAsId))
        })
        .or_else(|| {
            find_nested(&nested, |rf| {
                rf.name
                    .map(|name| normalize_key(name) == lbl_key)
                    .unwrap_or(false)
            })
            .map(|v| (v, MatchRule::LabelExact))
        })
        .or_else(|| {
            find_nested(&nested, |rf| {
                rf.name
                    .map(|name| has_suffix_word(&normalize_key(name), &lbl_key))
                    .unwrap_or(false)
            })
            .map(|v| (v, MatchRule::LabelSuffix))
        })
        .or_else(|| {
            find_nested(&nested, |rf| {
                rf.name
                    .map(|name| has_word(&normalize_key(name), &lbl_key))
                    .unwrap_or(false)
            })
            .map(|v| (v, MatchRule::LabelWord))
        });

    if let Some((_, rule)) = &hit {
        debug!("Field '{}' matched nested via {:?}", field.id, rule);
    }
    hit
}

/// First nested entry satisfying the predicate with a non-empty value.
fn find_nested<'a, F>(
    nested: &[super::record::RecordField<'a>],
    predicate: F,
) -> Option<&'a Value>
where
    F: Fn(&super::record::RecordField<'a>) -> bool,
{
    nested
        .iter()
        .find(|rf| predicate(*rf) && !is_empty_value(rf.value))
        .map(|rf| rf.value)
}

/// Strategy 7: strategies 2–6 replayed against the flat bag keys.
///
/// Country-labelled fields skip the label-derived strategies here: more
/// than one country-ish key may be present in the flat bag
/// (`address_country` alongside `country`), and only the step-context
/// ordering of the country fallback picks the right one.
fn resolve_flat<'a>(field: &Field, record: &'a ExternalRecord) -> Option<(&'a Value, MatchRule)> {
    let entries = record.flat_entries();
    if entries.is_empty() {
        return None;
    }

    let id_key = normalize_key(&field.id);
    let lbl_key = label_key(&field.label);

    let mut hit =
        find_flat(&entries, |key| key == field.id || normalize_key(key) == id_key)
            .map(|v| (v, MatchRule::FlatId));

    if !is_country_label(field) {
        hit = hit
            .or_else(|| {
                find_flat(&entries, |key| normalize_key(key) == lbl_key)
                    .map(|v| (v, MatchRule::FlatLabelExact))
            })
            .or_else(|| {
                find_flat(&entries, |key| has_suffix_word(&normalize_key(key), &lbl_key))
                    .map(|v| (v, MatchRule::FlatLabelSuffix))
            })
            .or_else(|| {
                find_flat(&entries, |key| has_word(&normalize_key(key), &lbl_key))
                    .map(|v| (v, MatchRule::FlatLabelWord))
            });
    }

    if let Some((_, rule)) = &hit {
        debug!("Field '{}' matched the flat bag via {:?}", field.id, rule);
    }
    hit
}

/// First flat entry whose key satisfies the predicate with a non-empty
/// value.
fn find_flat<'a, F>(entries: &[(&str, &'a Value)], predicate: F) -> Option<&'a Value>
where
    F: Fn(&str) -> bool,
{
    entries
        .iter()
        .find(|&&(key, value)| predicate(key) && !is_empty_value(value))
        .map(|&(_, value)| value)
}

/// Strategy 8: the country fallback.
///
/// Applies only to fields whose label contains "country"
/// (case-insensitive). Probes literal flat keys, preferring
/// `address_country` when the owning step reads as an address section
/// and `country` otherwise.
fn resolve_country_fallback<'a>(
    field: &Field,
    step: &Step,
    record: &'a ExternalRecord,
) -> Option<(&'a Value, MatchRule)> {
    if !is_country_label(field) {
        return None;
    }

    let mut keys: Vec<&str> = COUNTRY_KEYS.to_vec();
    if !is_address_step(step) {
        // Outside address context, a bare `country` key outranks the
        // address-prefixed one
        keys.swap(0, 1);
    }

    for key in keys {
        if let Some(value) = record.flat_get(key) {
            if !is_empty_value(value) {
                debug!(
                    "Field '{}' (step '{}') resolved via country fallback key '{}'",
                    field.id, step.id, key
                );
                return Some((value, MatchRule::CountryFallback));
            }
        }
    }

    None
}

/// Returns true for fields routed through the country fallback.
fn is_country_label(field: &Field) -> bool {
    field.label.to_lowercase().contains("country")
}

/// Address-context heuristic: the step's name or id contains "address".
fn is_address_step(step: &Step) -> bool {
    step.name.to_lowercase().contains("address") || step.id.to_lowercase().contains("address")
}

/// Maps a server-reported field reference back to a schema field id.
///
/// Remote validation errors carry a `field_name` and `field_label`; both
/// are matched against the schema with the same ladder used for records:
/// exact id, normalized id, normalized label, suffix, then word match.
pub fn match_server_field(
    schema: &crate::schema::WorkflowSchema,
    field_name: &str,
    field_label: &str,
) -> Option<String> {
    let name_key = normalize_key(field_name);
    let label_norm = normalize_key(field_label);

    // Exact and normalized id
    for (_, field) in schema.all_fields() {
        if field.id == field_name || normalize_key(&field.id) == name_key {
            return Some(field.id.clone());
        }
    }

    // Label equality against either reported member
    for (_, field) in schema.all_fields() {
        let lbl = label_key(&field.label);
        if lbl == name_key || (!label_norm.is_empty() && lbl == label_norm) {
            return Some(field.id.clone());
        }
    }

    // Suffix, then word containment
    for (_, field) in schema.all_fields() {
        if has_suffix_word(&name_key, &label_key(&field.label)) {
            return Some(field.id.clone());
        }
    }
    for (_, field) in schema.all_fields() {
        if has_word(&name_key, &label_key(&field.label)) {
            return Some(field.id.clone());
        }
    }

    None
}
