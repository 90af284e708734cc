//! JSON envelope extraction from model response text.
//!
//! Vision models asked for JSON routinely wrap it in markdown code fences or
//! surround it with prose. The extraction here is shared by the hosted
//! providers and the normalizer, so both tolerate the same shapes.

use serde_json::{Map, Value};

use crate::types::AnalysisResult;

/// Strip a surrounding markdown code fence (``` or ```json) if present.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json", "JSON", …) up to the first newline.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Pull a JSON value out of model text.
///
/// Tries the fence-stripped text verbatim first, then the widest
/// `{...}` span for JSON embedded in prose. Returns `None` when no
/// parseable JSON is present.
pub fn extract_json(text: &str) -> Option<Value> {
    let stripped = strip_code_fence(text);
    if let Ok(value) = serde_json::from_str(stripped) {
        return Some(value);
    }
    let start = stripped.find('{')?;
    let end = stripped.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&stripped[start..=end]).ok()
}

/// Build a best-effort `AnalysisResult` from model response text.
///
/// When the text parses to a JSON object, the caption and metadata are
/// lifted from it and the object becomes the raw payload. Otherwise the raw
/// text itself is the payload and the caption stays empty; partial success
/// beats total failure here, and the normalizer handles the rest.
pub fn result_from_text(provider: &str, text: &str) -> AnalysisResult {
    match extract_json(text) {
        Some(Value::Object(obj)) => {
            let caption = obj
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string();
            let metadata = obj
                .get("metadata")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            AnalysisResult::new(provider, caption, Value::Object(obj), metadata)
        }
        _ => AnalysisResult::new(
            provider,
            "",
            Value::String(text.to_string()),
            Map::new(),
        ),
    }
}
