//! Schema document model.
//!
//! A `SchemaDocument` is the structural contract one category's analysis
//! documents must satisfy: required top-level keys plus per-field metadata
//! specs with type, range, and default rules. Documents are data; admins
//! edit them in the durable store, so the model round-trips through JSON.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::types::Category;

/// Sentinel applied to unset enumerable metadata fields by the clean step.
pub const METADATA_SENTINEL: &str = "OTHER";

/// Top-level keys every canonical document carries.
pub const REQUIRED_TOP_LEVEL: [&str; 4] =
    ["description", "analysis", "recommended_actions", "metadata"];

/// Value type of a metadata field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    Integer,
}

/// Contract for one metadata sub-field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSpec {
    /// Field name under `metadata`
    pub name: String,

    /// Expected value type
    pub kind: FieldKind,

    /// Whether the field must be present
    pub required: bool,

    /// Whether an explicit null is acceptable
    pub nullable: bool,

    /// Inclusive lower bound (numeric kinds)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    /// Inclusive upper bound (numeric kinds)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    /// Value the clean step applies when the field is absent or null
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl Default for FieldSpec {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: FieldKind::Text,
            required: false,
            nullable: true,
            min: None,
            max: None,
            default: None,
        }
    }
}

impl FieldSpec {
    pub fn text(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn number(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Number,
            ..Self::default()
        }
    }

    /// Mark the field required (and non-nullable).
    pub fn required(mut self) -> Self {
        self.required = true;
        self.nullable = false;
        self
    }

    /// Set inclusive bounds.
    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// Set an inclusive lower bound only.
    pub fn at_least(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Set the clean-step default.
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// The structural contract for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    /// Category this schema applies to
    pub category: String,

    /// Required top-level document keys
    pub required: Vec<String>,

    /// Metadata sub-field contracts
    pub metadata_fields: Vec<FieldSpec>,
}

impl SchemaDocument {
    /// Built-in schema for scanned/rendered crisis maps.
    ///
    /// Enumerable fields default to the OTHER sentinel when unset; maps
    /// without provenance are still worth keeping.
    pub fn crisis_map() -> Self {
        Self {
            category: Category::CRISIS_MAP.to_string(),
            required: REQUIRED_TOP_LEVEL.iter().map(|s| s.to_string()).collect(),
            metadata_fields: vec![
                FieldSpec::text("source")
                    .required()
                    .default_value(json!(METADATA_SENTINEL)),
                FieldSpec::text("type").default_value(json!(METADATA_SENTINEL)),
                FieldSpec::text("epsg").default_value(json!(METADATA_SENTINEL)),
                FieldSpec::text("region"),
                FieldSpec::text("event_date"),
            ],
        }
    }

    /// Built-in schema for drone-captured aerial imagery.
    ///
    /// The geospatial field set is all-nullable and never defaulted:
    /// partial telemetry is expected, and a fabricated default would
    /// misrepresent sensor data.
    pub fn drone_image() -> Self {
        Self {
            category: Category::DRONE_IMAGE.to_string(),
            required: REQUIRED_TOP_LEVEL.iter().map(|s| s.to_string()).collect(),
            metadata_fields: vec![
                FieldSpec::number("latitude").range(-90.0, 90.0),
                FieldSpec::number("longitude").range(-180.0, 180.0),
                FieldSpec::number("altitude_m"),
                FieldSpec::number("heading_deg").range(0.0, 360.0),
                FieldSpec::number("pitch_deg").range(-90.0, 90.0),
                FieldSpec::number("roll_deg").range(-180.0, 180.0),
                FieldSpec::number("yaw_deg").range(-180.0, 180.0),
                FieldSpec::number("horizontal_accuracy_m").at_least(0.0),
                FieldSpec::number("vertical_accuracy_m").at_least(0.0),
            ],
        }
    }

    /// Look up a field spec by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.metadata_fields.iter().find(|f| f.name == name)
    }

    /// Render extraction instructions for a model prompt.
    ///
    /// Lists the canonical keys and every metadata field with its type so
    /// backends without per-category prompt templates still produce
    /// schema-shaped output.
    pub fn metadata_instructions(&self) -> String {
        let mut fields = String::new();
        for spec in &self.metadata_fields {
            let kind = match spec.kind {
                FieldKind::Text => "string",
                FieldKind::Number => "number",
                FieldKind::Integer => "integer",
            };
            let requirement = if spec.required { "required" } else { "optional, null if unknown" };
            fields.push_str(&format!("- {} ({kind}, {requirement})\n", spec.name));
        }
        format!(
            "Respond with a single JSON object with keys \"description\", \
             \"analysis\", \"recommended_actions\", and \"metadata\". \
             The metadata object may contain:\n{fields}"
        )
    }
}
