//! Formflow - Dynamic Form Workflow Engine
//!
//! A library for ERP onboarding flows: declarative form workflows
//! (ordered steps of typed fields) rendered as stepped wizards,
//! reconciled against backend records whose field naming may not match
//! the schema, validated locally and remotely, and persisted with a
//! remote-primary / local-fallback policy.
//!
//! # Architecture
//!
//! The library is organized into five main modules:
//!
//! - [`schema`]: Data structures, parsing and validation for workflow
//!   schemas
//! - [`form`]: Form values, local validation rules and the stepped
//!   wizard controller
//! - [`reconcile`]: The field-reconciliation engine and its inverse
//!   payload mapping
//! - [`store`]: Remote API client, local fallback store and the edit
//!   session loader
//! - [`connect`]: The workflow-to-workflow connector canvas
//!
//! # Example
//!
//! ```rust,no_run
//! use formflow::form::{FormValue, FormValueMap, Wizard};
//! use formflow::reconcile::{build_payload, reconcile, ExternalRecord};
//! use formflow::schema::load_schema;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Load a workflow schema from YAML
//!     let schema = load_schema("onboarding.yaml")?;
//!
//!     // Merge an existing record into fresh form values
//!     let record = ExternalRecord::new(serde_json::json!({
//!         "company_name": "Acme GmbH",
//!         "address_country": "Germany",
//!     }));
//!     let mut values = FormValueMap::new();
//!     reconcile(&schema, &record, &mut values);
//!
//!     // Drive the wizard and build the submission payload
//!     let mut wizard = Wizard::with_values(schema, values);
//!     wizard.set_value("company_name", FormValue::Text("Acme GmbH".into()));
//!     let payload = build_payload(wizard.schema(), wizard.values());
//!     println!("{}", serde_json::Value::Object(payload));
//!     Ok(())
//! }
//! ```

pub mod connect;
pub mod form;
pub mod reconcile;
pub mod schema;
pub mod store;

// Re-export commonly used types
pub use form::{FormValue, FormValueMap, Wizard};
pub use reconcile::{build_payload, reconcile, ExternalRecord};
pub use schema::{load_schema, Field, FieldType, Step, WorkflowSchema};
pub use store::{ApiClient, EditSession, LocalStore, StoreError, WorkflowStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "Formflow";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_app_name() {
        assert_eq!(APP_NAME, "Formflow");
    }

    #[test]
    fn test_module_exports_schema() {
        let schema = WorkflowSchema::new("Smoke");
        assert!(schema.is_empty());
    }

    #[test]
    fn test_module_exports_field() {
        let field = Field::new("f", FieldType::Text, "F");
        assert_eq!(field.id, "f");
    }

    #[test]
    fn test_version_format() {
        let parts: Vec<&str> = VERSION.split('.').collect();
        assert!(parts.len() >= 2, "Version should have at least major.minor");
        for part in parts {
            assert!(part.parse::<u32>().is_ok(), "Version components should be numeric");
        }
    }
}
