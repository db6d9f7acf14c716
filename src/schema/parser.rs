//! Schema Files
//!
//! Handles loading and saving workflow schema definitions from disk.
//! Schemas are authored as YAML (builder exports) or JSON (API dumps);
//! the format is chosen by file extension.

use std::error::Error;
use std::fs;
use std::path::Path;

use log::{debug, info};

use super::model::WorkflowSchema;
use super::validator::validate_schema;

/// Loads a workflow schema from a YAML or JSON file.
///
/// This function:
/// 1. Reads the file and parses it by extension (`.json` → JSON, else YAML)
/// 2. Validates the schema structure
/// 3. Normalizes step ordering
///
/// # Example
///
/// ```rust,no_run
/// use formflow::schema::load_schema;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let schema = load_schema("onboarding.yaml")?;
///     println!("Loaded {} steps", schema.steps.len());
///     Ok(())
/// }
/// ```
pub fn load_schema(path: &str) -> Result<WorkflowSchema, Box<dyn Error>> {
    info!("Loading workflow schema from: {}", path);

    let content = fs::read_to_string(path).map_err(|e| {
        format!(
            "Failed to read schema file '{}': {}. Check that the file exists and is readable.",
            path, e
        )
    })?;

    debug!("Schema content loaded ({} bytes)", content.len());

    let mut schema: WorkflowSchema = if is_json(path) {
        serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse schema JSON: {}. Check the file format.", e))?
    } else {
        serde_yaml::from_str(&content)
            .map_err(|e| format!("Failed to parse schema YAML: {}. Check the file format.", e))?
    };

    info!(
        "Parsed workflow '{}': {} steps, {} fields",
        schema.name,
        schema.steps.len(),
        schema.all_fields().count()
    );

    validate_schema(&mut schema)?;

    Ok(schema)
}

/// Parses a schema out of an already-deserialized JSON value.
///
/// Used for API responses, which arrive as `serde_json::Value` bodies
/// rather than files.
pub fn schema_from_value(value: serde_json::Value) -> Result<WorkflowSchema, String> {
    let mut schema: WorkflowSchema = serde_json::from_value(value)
        .map_err(|e| format!("Failed to decode workflow schema: {}", e))?;
    validate_schema(&mut schema)?;
    Ok(schema)
}

/// Saves a workflow schema to a YAML or JSON file.
pub fn save_schema(schema: &WorkflowSchema, path: &str) -> Result<(), Box<dyn Error>> {
    let content = if is_json(path) {
        serde_json::to_string_pretty(schema)?
    } else {
        serde_yaml::to_string(schema)?
    };

    fs::write(path, content)?;
    info!("Schema saved to: {}", path);
    Ok(())
}

fn is_json(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}
