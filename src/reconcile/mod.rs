//! Field Reconciliation Module
//!
//! Merges backend records whose field naming may not match the schema's
//! identifiers into form value maps, and produces the inverse flat
//! payload for submission.
//!
//! # Structure
//!
//! - [`normalize`]: snake_case key normalization and word matching
//! - [`record`]: uniform views over flat and nested record shapes
//! - [`matcher`]: the ordered matching strategy ladder
//! - [`engine`]: the merge pass, option canonicalization, repair pass
//! - [`payload`]: inverse mapping to the submission payload

pub mod engine;
pub mod matcher;
pub mod normalize;
pub mod payload;
pub mod record;

pub use engine::{
    canonicalize_items, canonicalize_option, reconcile, repair_country_fields, OptionMatch,
    Reconciliation,
};
pub use matcher::{match_server_field, resolve_field, MatchRule};
pub use normalize::{label_key, normalize_key};
pub use payload::build_payload;
pub use record::ExternalRecord;
