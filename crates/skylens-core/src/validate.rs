//! Normalization and validation of analysis documents.
//!
//! Backends return heterogeneous shapes: pre-parsed objects, JSON strings
//! wrapped in markdown fences, or flat prose. Everything is reduced to the
//! canonical `{description, analysis, recommended_actions, metadata}`
//! document, checked against the category schema, and cleaned. Validation
//! failure is a routine outcome: the original document is returned alongside
//! the diagnostics, never discarded.

use serde_json::{Map, Value};

use crate::analysis::envelope;
use crate::schema::{FieldKind, FieldSpec, SchemaDocument};
use crate::types::ValidationOutcome;

/// Normalize a raw provider payload into the canonical document shape.
///
/// One `response`/`content` envelope level is unwrapped; string payloads are
/// parsed as (possibly fenced) JSON; anything unparseable becomes a document
/// whose `analysis` carries the raw text. Objects are completed in place:
/// missing canonical keys are filled with empty values, so the legacy
/// two-field `{analysis, metadata}` shape migrates without data loss.
pub fn normalize(raw: &Value) -> Value {
    let unwrapped = unwrap_envelope(raw);
    match unwrapped {
        Value::String(text) => match envelope::extract_json(text) {
            Some(Value::Object(obj)) => fill_canonical(obj),
            _ => synthesized(text),
        },
        Value::Object(obj) => fill_canonical(obj.clone()),
        Value::Null => fill_canonical(Map::new()),
        other => synthesized(&other.to_string()),
    }
}

/// Unwrap one nested `response`/`content` level, if present.
fn unwrap_envelope(raw: &Value) -> &Value {
    if let Some(obj) = raw.as_object() {
        if let Some(inner) = obj.get("response").or_else(|| obj.get("content")) {
            return inner;
        }
    }
    raw
}

/// Canonical document carrying unstructured text in `analysis`.
fn synthesized(text: &str) -> Value {
    let mut obj = Map::new();
    obj.insert("description".to_string(), Value::String(String::new()));
    obj.insert("analysis".to_string(), Value::String(text.to_string()));
    obj.insert(
        "recommended_actions".to_string(),
        Value::String(String::new()),
    );
    obj.insert("metadata".to_string(), Value::Object(Map::new()));
    Value::Object(obj)
}

/// Complete an object to the canonical shape without touching present keys.
fn fill_canonical(mut obj: Map<String, Value>) -> Value {
    for key in ["description", "analysis", "recommended_actions"] {
        obj.entry(key.to_string())
            .or_insert_with(|| Value::String(String::new()));
    }
    obj.entry("metadata".to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    Value::Object(obj)
}

/// Check a normalized document against a schema.
///
/// Every violation is collected, not just the first, with a
/// path-qualified message.
pub fn validate_document(document: &Value, schema: &SchemaDocument) -> Vec<String> {
    let mut violations = Vec::new();

    let Some(obj) = document.as_object() else {
        return vec!["document: expected a JSON object".to_string()];
    };

    for key in &schema.required {
        if !obj.contains_key(key) {
            violations.push(format!("{key}: required field is missing"));
        }
    }

    for key in ["description", "analysis", "recommended_actions"] {
        if let Some(value) = obj.get(key) {
            if !value.is_string() {
                violations.push(format!("{key}: expected a string"));
            }
        }
    }

    match obj.get("metadata") {
        Some(Value::Object(metadata)) => {
            for spec in &schema.metadata_fields {
                check_field(metadata, spec, &mut violations);
            }
        }
        Some(_) => violations.push("metadata: expected an object".to_string()),
        None => {} // already reported by the required-keys pass
    }

    violations
}

fn check_field(metadata: &Map<String, Value>, spec: &FieldSpec, violations: &mut Vec<String>) {
    let path = format!("metadata.{}", spec.name);
    match metadata.get(&spec.name) {
        None => {
            if spec.required {
                violations.push(format!("{path}: required field is missing"));
            }
        }
        Some(Value::Null) => {
            if !spec.nullable {
                violations.push(format!("{path}: must not be null"));
            }
        }
        Some(value) => check_value(&path, value, spec, violations),
    }
}

fn check_value(path: &str, value: &Value, spec: &FieldSpec, violations: &mut Vec<String>) {
    match spec.kind {
        FieldKind::Text => {
            if !value.is_string() {
                violations.push(format!("{path}: expected a string"));
            }
        }
        FieldKind::Number | FieldKind::Integer => {
            let number = match spec.kind {
                FieldKind::Integer => value.as_i64().map(|n| n as f64),
                _ => value.as_f64(),
            };
            let Some(number) = number else {
                let expected = if spec.kind == FieldKind::Integer {
                    "an integer"
                } else {
                    "a number"
                };
                violations.push(format!("{path}: expected {expected}"));
                return;
            };
            if let Some(min) = spec.min {
                if number < min {
                    violations.push(format!("{path}: {number} is below the minimum {min}"));
                }
            }
            if let Some(max) = spec.max {
                if number > max {
                    violations.push(format!("{path}: {number} is above the maximum {max}"));
                }
            }
        }
    }
}

/// Apply schema defaults to absent or null metadata fields.
///
/// Only fields with a declared default are touched; everything else,
/// including absent drone telemetry, is left exactly as validated, so
/// cleaning an already-clean document is the identity.
pub fn apply_defaults(mut document: Value, schema: &SchemaDocument) -> Value {
    if let Some(metadata) = document
        .as_object_mut()
        .and_then(|obj| obj.get_mut("metadata"))
        .and_then(Value::as_object_mut)
    {
        for spec in &schema.metadata_fields {
            let Some(default) = &spec.default else {
                continue;
            };
            let unset = match metadata.get(&spec.name) {
                None | Some(Value::Null) => true,
                Some(_) => false,
            };
            if unset {
                metadata.insert(spec.name.clone(), default.clone());
            }
        }
    }
    document
}

/// Normalize, validate, and clean one raw provider payload.
///
/// On success the cleaned document is returned with `is_valid = true`; on
/// failure the normalized-but-unclean document is returned with every
/// violation concatenated, for the caller to persist as a degraded record.
pub fn clean_and_validate(raw: &Value, schema: &SchemaDocument) -> ValidationOutcome {
    let document = normalize(raw);
    let violations = validate_document(&document, schema);

    if violations.is_empty() {
        ValidationOutcome {
            document: apply_defaults(document, schema),
            is_valid: true,
            error_message: None,
        }
    } else {
        tracing::debug!(
            category = %schema.category,
            violations = violations.len(),
            "document failed schema validation"
        );
        ValidationOutcome {
            document,
            is_valid: false,
            error_message: Some(violations.join("; ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn crisis_map() -> SchemaDocument {
        SchemaDocument::crisis_map()
    }

    fn drone() -> SchemaDocument {
        SchemaDocument::drone_image()
    }

    fn valid_crisis_doc() -> Value {
        json!({
            "description": "Flood extent map of the delta region",
            "analysis": "Inundation concentrated along the eastern bank.",
            "recommended_actions": "Prioritize evacuation of sector 4.",
            "metadata": {
                "source": "OTHER",
                "type": "flood",
                "epsg": "4326",
            }
        })
    }

    // --- normalize ---

    #[test]
    fn test_normalize_passes_canonical_object_through() {
        let doc = valid_crisis_doc();
        assert_eq!(normalize(&doc), doc);
    }

    #[test]
    fn test_normalize_unwraps_response_envelope() {
        let raw = json!({"response": valid_crisis_doc()});
        assert_eq!(normalize(&raw), valid_crisis_doc());
    }

    #[test]
    fn test_normalize_unwraps_content_string() {
        let raw = json!({"content": "{\"analysis\": \"x\", \"metadata\": {}}"});
        let doc = normalize(&raw);
        assert_eq!(doc["analysis"], "x");
        assert_eq!(doc["description"], "");
    }

    #[test]
    fn test_normalize_synthesizes_from_flat_text() {
        let raw = json!("a hillside with scattered debris");
        let doc = normalize(&raw);
        assert_eq!(doc["description"], "");
        assert_eq!(doc["analysis"], "a hillside with scattered debris");
        assert_eq!(doc["recommended_actions"], "");
        assert_eq!(doc["metadata"], json!({}));
    }

    #[test]
    fn test_normalize_migrates_legacy_two_field_shape() {
        let raw = json!({"analysis": "legacy text", "metadata": {"source": "UN"}});
        let doc = normalize(&raw);
        assert_eq!(doc["analysis"], "legacy text");
        assert_eq!(doc["metadata"]["source"], "UN");
        assert_eq!(doc["description"], "");
        assert_eq!(doc["recommended_actions"], "");
    }

    #[test]
    fn test_normalize_parses_fenced_json_string() {
        let raw = json!("```json\n{\"analysis\":\"x\"}\n```");
        let doc = normalize(&raw);
        assert_eq!(doc["analysis"], "x");
        assert_eq!(doc["metadata"], json!({}));
    }

    // --- validate ---

    #[test]
    fn test_valid_document_has_no_violations() {
        assert!(validate_document(&valid_crisis_doc(), &crisis_map()).is_empty());
    }

    #[test]
    fn test_missing_source_names_the_field() {
        let mut doc = valid_crisis_doc();
        doc["metadata"].as_object_mut().unwrap().remove("source");
        let violations = validate_document(&doc, &crisis_map());
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("metadata.source"));
    }

    #[test]
    fn test_source_defaulted_to_sentinel_passes() {
        // The shape the clean step produces: sentinel source is acceptable.
        let doc = valid_crisis_doc();
        assert_eq!(doc["metadata"]["source"], "OTHER");
        assert!(validate_document(&doc, &crisis_map()).is_empty());
    }

    #[test]
    fn test_heading_bounds_are_inclusive() {
        let schema = drone();
        for heading in [0.0, 360.0] {
            let doc = json!({
                "description": "", "analysis": "", "recommended_actions": "",
                "metadata": {"heading_deg": heading}
            });
            assert!(
                validate_document(&doc, &schema).is_empty(),
                "heading {heading} should pass"
            );
        }

        let doc = json!({
            "description": "", "analysis": "", "recommended_actions": "",
            "metadata": {"heading_deg": 360.1}
        });
        let violations = validate_document(&doc, &schema);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("heading_deg"));
    }

    #[test]
    fn test_latitude_and_accuracy_bounds() {
        let doc = json!({
            "description": "", "analysis": "", "recommended_actions": "",
            "metadata": {"latitude": -90.5, "horizontal_accuracy_m": -1.0}
        });
        let violations = validate_document(&doc, &drone());
        assert_eq!(violations.len(), 2);
        assert!(violations.iter().any(|v| v.contains("metadata.latitude")));
        assert!(violations
            .iter()
            .any(|v| v.contains("metadata.horizontal_accuracy_m")));
    }

    #[test]
    fn test_null_telemetry_is_acceptable() {
        let doc = json!({
            "description": "", "analysis": "", "recommended_actions": "",
            "metadata": {"latitude": null, "heading_deg": null}
        });
        assert!(validate_document(&doc, &drone()).is_empty());
    }

    #[test]
    fn test_wrong_types_collected_with_paths() {
        let doc = json!({
            "description": 7,
            "analysis": "",
            "recommended_actions": "",
            "metadata": {"source": 12, "type": "flood"}
        });
        let violations = validate_document(&doc, &crisis_map());
        assert!(violations.iter().any(|v| v.starts_with("description:")));
        assert!(violations.iter().any(|v| v.contains("metadata.source")));
    }

    #[test]
    fn test_metadata_must_be_object() {
        let doc = json!({
            "description": "", "analysis": "", "recommended_actions": "",
            "metadata": "not an object"
        });
        let violations = validate_document(&doc, &crisis_map());
        assert!(violations.iter().any(|v| v.contains("metadata: expected an object")));
    }

    // --- clean ---

    #[test]
    fn test_defaults_fill_unset_enumerables() {
        let doc = json!({
            "description": "d", "analysis": "a", "recommended_actions": "r",
            "metadata": {"source": "UNOSAT", "epsg": null}
        });
        let cleaned = apply_defaults(doc, &crisis_map());
        assert_eq!(cleaned["metadata"]["source"], "UNOSAT");
        assert_eq!(cleaned["metadata"]["type"], "OTHER");
        assert_eq!(cleaned["metadata"]["epsg"], "OTHER");
    }

    #[test]
    fn test_drone_fields_are_never_defaulted() {
        let doc = json!({
            "description": "d", "analysis": "a", "recommended_actions": "r",
            "metadata": {"latitude": null}
        });
        let cleaned = apply_defaults(doc.clone(), &drone());
        assert_eq!(cleaned, doc);
    }

    // --- clean_and_validate ---

    #[test]
    fn test_clean_is_idempotent_on_valid_documents() {
        let schema = crisis_map();
        let first = clean_and_validate(&valid_crisis_doc(), &schema);
        assert!(first.is_valid);
        let second = clean_and_validate(&first.document, &schema);
        assert!(second.is_valid);
        assert_eq!(first.document, second.document);
    }

    #[test]
    fn test_fenced_legacy_scenario() {
        // Fenced legacy shape for crisis_map: normalizes into the canonical
        // document, then fails validation because required metadata
        // sub-fields are absent. The document is still returned.
        let raw = json!("```json\n{\"analysis\":\"x\"}\n```");
        let outcome = clean_and_validate(&raw, &crisis_map());
        assert!(!outcome.is_valid);
        assert_eq!(outcome.document["analysis"], "x");
        assert_eq!(outcome.document["description"], "");
        assert_eq!(outcome.document["recommended_actions"], "");
        assert_eq!(outcome.document["metadata"], json!({}));
        assert!(outcome
            .error_message
            .as_deref()
            .unwrap()
            .contains("metadata.source"));
    }

    #[test]
    fn test_invalid_outcome_returns_unclean_document() {
        // Missing source fails; the type field must NOT be defaulted on the
        // failure path.
        let raw = json!({
            "description": "d", "analysis": "a", "recommended_actions": "r",
            "metadata": {}
        });
        let outcome = clean_and_validate(&raw, &crisis_map());
        assert!(!outcome.is_valid);
        assert_eq!(outcome.document["metadata"], json!({}));
    }

    #[test]
    fn test_valid_outcome_is_cleaned() {
        let raw = json!({
            "description": "d", "analysis": "a", "recommended_actions": "r",
            "metadata": {"source": "UNOSAT"}
        });
        let outcome = clean_and_validate(&raw, &crisis_map());
        assert!(outcome.is_valid);
        assert!(outcome.error_message.is_none());
        assert_eq!(outcome.document["metadata"]["type"], "OTHER");
        assert_eq!(outcome.document["metadata"]["epsg"], "OTHER");
    }

    #[test]
    fn test_violations_are_all_collected() {
        let raw = json!({
            "analysis": 5,
            "metadata": {"source": 12}
        });
        let outcome = clean_and_validate(&raw, &crisis_map());
        let message = outcome.error_message.unwrap();
        assert!(message.contains("analysis: expected a string"));
        assert!(message.contains("metadata.source"));
    }
}
