//! Workflow Schema Data Model
//!
//! Core data structures representing form workflows: an ordered set of
//! steps, each holding an ordered set of typed fields.
//!
//! # Example YAML Format
//!
//! ```yaml
//! name: Company Onboarding
//! is_active: true
//! steps:
//!   - id: general
//!     name: General Information
//!     fields:
//!       - id: company_name
//!         type: text
//!         label: Company Name
//!         required: true
//!       - id: country
//!         type: select
//!         label: Country
//!         options: [Germany, France, Netherlands]
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The closed set of field types a workflow may declare.
///
/// Serialized in lowercase so schema files and API payloads use
/// `daterange`, `multiselect` etc. as the wire names.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Email,
    Number,
    Phone,
    Url,
    Textarea,
    Date,
    Time,
    DateRange,
    Checkbox,
    Switch,
    Select,
    Radio,
    Combobox,
    MultiSelect,
    Slider,
    Rating,
    File,
    Color,
}

impl FieldType {
    /// Returns true for fields with a closed `options` list.
    pub fn is_choice(&self) -> bool {
        matches!(
            self,
            Self::Select | Self::Radio | Self::Combobox | Self::MultiSelect
        )
    }

    /// Returns true for fields whose value is a boolean.
    pub fn is_boolean(&self) -> bool {
        matches!(self, Self::Checkbox | Self::Switch)
    }

    /// Returns true for fields whose value is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Number | Self::Slider | Self::Rating)
    }

    /// Returns true for fields that collect multiple values.
    pub fn is_multi(&self) -> bool {
        matches!(self, Self::MultiSelect)
    }
}

/// Per-field validation constraints.
///
/// Which members apply depends on the field type: `min`/`max` bound
/// numeric fields, `pattern` is a regex for text-like fields, and
/// `accept` lists permitted file extensions for file fields.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct FieldValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accept: Vec<String>,
}

/// Column-span hint for rendering. Does not affect behavior.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldWidth {
    #[default]
    Full,
    Half,
    Third,
}

/// Type-specific extras (slider step size, rating stars, file multiplicity).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct FieldConfig {
    /// Increment for slider fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slider_step: Option<f64>,

    /// Maximum stars for rating fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_stars: Option<u32>,

    /// Whether a file field accepts multiple files.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub multiple: bool,
}

impl FieldConfig {
    fn is_default(&self) -> bool {
        self.slider_step.is_none() && self.max_stars.is_none() && !self.multiple
    }
}

/// A single typed field within a workflow step.
///
/// The `id` is the stable form-state key; the `label` is the display name
/// and doubles as the semantic matching key when an external record does
/// not use the `id` convention.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Field {
    /// Stable identifier, unique across all steps of the owning workflow
    pub id: String,

    /// Field type driving rendering, coercion and validation
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Human-readable display name
    pub label: String,

    /// Whether a value must be present before the step validates
    #[serde(default)]
    pub required: bool,

    /// Closed list of permitted values for choice fields
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,

    /// Optional validation constraints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<FieldValidation>,

    /// Layout hint for the renderer
    #[serde(default, skip_serializing_if = "is_full_width")]
    pub width: FieldWidth,

    /// Type-specific extras
    #[serde(default, skip_serializing_if = "FieldConfig::is_default")]
    pub config: FieldConfig,
}

fn is_full_width(w: &FieldWidth) -> bool {
    *w == FieldWidth::Full
}

impl Field {
    /// Creates a new field with the given id, type and label.
    ///
    /// # Example
    ///
    /// ```
    /// use formflow::schema::{Field, FieldType};
    ///
    /// let field = Field::new("country", FieldType::Select, "Country")
    ///     .with_options(vec!["Germany".into(), "France".into()])
    ///     .required();
    /// ```
    pub fn new(id: impl Into<String>, field_type: FieldType, label: impl Into<String>) -> Self {
        Self {
            id: id.into().trim().to_string(),
            field_type,
            label: label.into().trim().to_string(),
            required: false,
            options: Vec::new(),
            validation: None,
            width: FieldWidth::Full,
            config: FieldConfig::default(),
        }
    }

    /// Marks the field as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the options list for choice fields.
    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }

    /// Sets the validation constraints.
    pub fn with_validation(mut self, validation: FieldValidation) -> Self {
        self.validation = Some(validation);
        self
    }

    /// Sets the layout width hint.
    pub fn with_width(mut self, width: FieldWidth) -> Self {
        self.width = width;
        self
    }

    /// Sets the type-specific config.
    pub fn with_config(mut self, config: FieldConfig) -> Self {
        self.config = config;
        self
    }
}

/// An ordered group of fields presented as one wizard page.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Step {
    /// Unique identifier within the workflow
    pub id: String,

    /// Display name (e.g. "General Information", "Addresses")
    pub name: String,

    /// Optional description shown under the step title
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// 1-based position; kept contiguous by the schema operations
    #[serde(default)]
    pub order: u32,

    /// Ordered fields collected by this step
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Step {
    /// Creates a new step with the given id and name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into().trim().to_string(),
            name: name.into().trim().to_string(),
            description: String::new(),
            order: 0,
            fields: Vec::new(),
        }
    }

    /// Sets the step description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Appends a field to this step.
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Finds a field by id.
    pub fn get_field(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }
}

/// A complete, versioned form workflow definition.
///
/// The authoritative description of what data to collect: ordered steps of
/// typed fields, plus the ids of workflows sequenced after this one on the
/// connector canvas.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WorkflowSchema {
    /// Opaque identifier, stable across edits
    pub id: String,

    /// Display name
    pub name: String,

    /// Display description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Whether the workflow may be selected for new records
    #[serde(default = "default_active")]
    pub is_active: bool,

    /// Ids of workflows that run after this one completes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connected_workflows: Vec<String>,

    /// Creation timestamp, preserved across updates
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    /// Last-modified timestamp, refreshed on every update
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,

    /// Ordered steps; `order` values are contiguous starting at 1
    #[serde(default)]
    pub steps: Vec<Step>,
}

fn default_active() -> bool {
    true
}

impl WorkflowSchema {
    /// Creates a new empty workflow with a generated id.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into().trim().to_string(),
            description: String::new(),
            is_active: true,
            connected_workflows: Vec::new(),
            created_at: now,
            updated_at: now,
            steps: Vec::new(),
        }
    }

    /// Creates a workflow from a list of steps, renumbering their order.
    pub fn from_steps(name: impl Into<String>, steps: Vec<Step>) -> Self {
        let mut schema = Self::new(name);
        schema.steps = steps;
        schema.renumber_steps();
        schema
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Appends a step, rejecting duplicate step ids.
    pub fn add_step(&mut self, step: Step) -> Result<(), String> {
        if self.steps.iter().any(|s| s.id == step.id) {
            return Err(format!("Step '{}' already exists", step.id));
        }
        self.steps.push(step);
        self.renumber_steps();
        Ok(())
    }

    /// Removes a step by id.
    pub fn remove_step(&mut self, id: &str) -> Result<(), String> {
        let index = self
            .steps
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| format!("Step '{}' not found", id))?;

        self.steps.remove(index);
        self.renumber_steps();
        Ok(())
    }

    /// Moves the step with the given id to a new 0-based position.
    pub fn move_step(&mut self, id: &str, to: usize) -> Result<(), String> {
        let from = self
            .steps
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| format!("Step '{}' not found", id))?;

        let to = to.min(self.steps.len().saturating_sub(1));
        let step = self.steps.remove(from);
        self.steps.insert(to, step);
        self.renumber_steps();
        Ok(())
    }

    /// Gets a step by id.
    pub fn get_step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Gets a mutable reference to a step by id.
    pub fn get_step_mut(&mut self, id: &str) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| s.id == id)
    }

    /// Finds a field anywhere in the workflow, with its owning step.
    pub fn find_field(&self, field_id: &str) -> Option<(&Step, &Field)> {
        self.steps.iter().find_map(|step| {
            step.fields
                .iter()
                .find(|f| f.id == field_id)
                .map(|f| (step, f))
        })
    }

    /// Iterates all fields across all steps in display order.
    pub fn all_fields(&self) -> impl Iterator<Item = (&Step, &Field)> {
        self.steps
            .iter()
            .flat_map(|step| step.fields.iter().map(move |f| (step, f)))
    }

    /// Rewrites step `order` values as a contiguous 1..N sequence.
    ///
    /// Called after every structural mutation so the ordering invariant
    /// holds regardless of what the input data claimed.
    pub fn renumber_steps(&mut self) {
        for (index, step) in self.steps.iter_mut().enumerate() {
            step.order = index as u32 + 1;
        }
    }

    /// Returns the number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the workflow has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Stamps `updated_at` with the current time.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_step_schema() -> WorkflowSchema {
        WorkflowSchema::from_steps(
            "Onboarding",
            vec![
                Step::new("general", "General Information").with_field(
                    Field::new("company_name", FieldType::Text, "Company Name").required(),
                ),
                Step::new("addresses", "Addresses").with_field(
                    Field::new("billing_country", FieldType::Select, "Country")
                        .with_options(vec!["Germany".into(), "France".into()]),
                ),
            ],
        )
    }

    #[test]
    fn test_field_builder() {
        let field = Field::new("email", FieldType::Email, "Primary Email")
            .required()
            .with_width(FieldWidth::Half);

        assert_eq!(field.id, "email");
        assert_eq!(field.label, "Primary Email");
        assert!(field.required);
        assert_eq!(field.width, FieldWidth::Half);
    }

    #[test]
    fn test_field_type_categories() {
        assert!(FieldType::Select.is_choice());
        assert!(FieldType::MultiSelect.is_choice());
        assert!(!FieldType::Text.is_choice());
        assert!(FieldType::Checkbox.is_boolean());
        assert!(FieldType::Switch.is_boolean());
        assert!(FieldType::Slider.is_numeric());
        assert!(FieldType::Rating.is_numeric());
        assert!(!FieldType::Date.is_numeric());
    }

    #[test]
    fn test_field_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&FieldType::DateRange).unwrap(),
            "\"daterange\""
        );
        assert_eq!(
            serde_json::to_string(&FieldType::MultiSelect).unwrap(),
            "\"multiselect\""
        );
        let parsed: FieldType = serde_json::from_str("\"combobox\"").unwrap();
        assert_eq!(parsed, FieldType::Combobox);
    }

    #[test]
    fn test_schema_add_step_renumbers() {
        let mut schema = two_step_schema();
        schema
            .add_step(Step::new("banking", "Banking Details"))
            .unwrap();

        let orders: Vec<u32> = schema.steps.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[test]
    fn test_schema_add_duplicate_step() {
        let mut schema = two_step_schema();
        assert!(schema.add_step(Step::new("general", "Again")).is_err());
    }

    #[test]
    fn test_schema_remove_step_renumbers() {
        let mut schema = two_step_schema();
        schema.add_step(Step::new("banking", "Banking")).unwrap();
        schema.remove_step("general").unwrap();

        let orders: Vec<u32> = schema.steps.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![1, 2]);
        assert_eq!(schema.steps[0].id, "addresses");
    }

    #[test]
    fn test_schema_remove_nonexistent_step() {
        let mut schema = two_step_schema();
        assert!(schema.remove_step("ghost").is_err());
    }

    #[test]
    fn test_schema_move_step() {
        let mut schema = two_step_schema();
        schema.add_step(Step::new("banking", "Banking")).unwrap();

        schema.move_step("banking", 0).unwrap();

        assert_eq!(schema.steps[0].id, "banking");
        let orders: Vec<u32> = schema.steps.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[test]
    fn test_schema_move_step_clamps_target() {
        let mut schema = two_step_schema();
        schema.move_step("general", 99).unwrap();

        assert_eq!(schema.steps.last().unwrap().id, "general");
        assert_eq!(schema.steps.last().unwrap().order, 2);
    }

    #[test]
    fn test_order_contiguous_after_mutation_sequence() {
        let mut schema = two_step_schema();
        schema.add_step(Step::new("a", "A")).unwrap();
        schema.add_step(Step::new("b", "B")).unwrap();
        schema.move_step("b", 0).unwrap();
        schema.remove_step("addresses").unwrap();
        schema.move_step("general", 2).unwrap();

        let orders: Vec<u32> = schema.steps.iter().map(|s| s.order).collect();
        assert_eq!(orders, (1..=schema.steps.len() as u32).collect::<Vec<_>>());
    }

    #[test]
    fn test_find_field() {
        let schema = two_step_schema();
        let (step, field) = schema.find_field("billing_country").unwrap();

        assert_eq!(step.id, "addresses");
        assert_eq!(field.label, "Country");
        assert!(schema.find_field("missing").is_none());
    }

    #[test]
    fn test_all_fields_order() {
        let schema = two_step_schema();
        let ids: Vec<&str> = schema.all_fields().map(|(_, f)| f.id.as_str()).collect();
        assert_eq!(ids, vec!["company_name", "billing_country"]);
    }

    #[test]
    fn test_schema_yaml_roundtrip() {
        let schema = two_step_schema();
        let yaml = serde_yaml::to_string(&schema).unwrap();
        let loaded: WorkflowSchema = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(loaded.steps.len(), 2);
        assert_eq!(loaded.steps[1].fields[0].field_type, FieldType::Select);
        assert_eq!(loaded.steps[1].fields[0].options.len(), 2);
    }

    #[test]
    fn test_touch_refreshes_updated_at() {
        let mut schema = two_step_schema();
        let before = schema.updated_at;
        std::thread::sleep(std::time::Duration::from_millis(5));
        schema.touch();
        assert!(schema.updated_at > before);
    }

    #[test]
    fn test_schema_defaults_on_deserialize() {
        let json = r#"{"id": "wf-1", "name": "Minimal"}"#;
        let schema: WorkflowSchema = serde_json::from_str(json).unwrap();

        assert!(schema.is_active);
        assert!(schema.steps.is_empty());
        assert!(schema.connected_workflows.is_empty());
    }
}
