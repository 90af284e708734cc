//! Core data types for the Skylens analysis pipeline.
//!
//! These types describe the request/response shapes shared by every analysis
//! backend and the records the caller persists after validation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Image classification that selects the validation schema and metadata
/// field set for a request.
///
/// Categories are supplied per request and never mutated; an unknown
/// category fails at schema lookup, not here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    /// Scanned or rendered crisis/situation maps.
    pub const CRISIS_MAP: &'static str = "crisis_map";

    /// Aerial imagery captured by drone, with geospatial telemetry.
    pub const DRONE_IMAGE: &'static str = "drone_image";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Category {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// Capability family of a backend.
///
/// A diagnostic tag, not a behavioral switch, with one policy exception:
/// manual-family providers are excluded from random selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderFamily {
    /// Remote hosted model endpoint
    Hosted,
    /// Deterministic placeholder backend
    Stub,
    /// Empty-result backend for hand-filled records
    Manual,
}

impl fmt::Display for ProviderFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hosted => f.write_str("hosted"),
            Self::Stub => f.write_str("stub"),
            Self::Manual => f.write_str("manual"),
        }
    }
}

/// Identity snapshot of a registered backend, for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    /// Unique registry name
    pub name: String,

    /// Capability family
    pub family: ProviderFamily,

    /// Local availability hint (credential present, endpoint configured)
    pub available_hint: bool,
}

/// Externally-governed availability state for one registered backend.
///
/// Sourced from durable storage and consumed read-only; at most one record
/// carries `is_fallback_default` (enforced by the store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRecord {
    pub name: String,
    pub is_available: bool,
    pub is_fallback_default: bool,
}

/// Canonical raw output shape shared by every backend.
///
/// Produced once per request and immutable after creation. The orchestrator
/// tags the fallback fields after the fact; providers always return them
/// unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Name of the provider that actually served the request
    pub provider_name: String,

    /// Best-effort caption text; may be empty when the backend produced
    /// structure but no description
    pub caption: String,

    /// Opaque provider payload: a parsed JSON object when the backend
    /// returned structure, or the raw response text otherwise. Diagnostic
    /// escape hatch; business logic reads the normalized document instead.
    pub raw_payload: Value,

    /// Extracted metadata fields, opaque until schema validation
    pub metadata: Map<String, Value>,

    /// Whether a fallback provider served this request
    pub fallback_used: bool,

    /// The originally-selected provider, when fallback was used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_provider_name: Option<String>,

    /// Why the original provider was abandoned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

impl AnalysisResult {
    /// Build a fresh result with fallback fields unset.
    pub fn new(
        provider_name: impl Into<String>,
        caption: impl Into<String>,
        raw_payload: Value,
        metadata: Map<String, Value>,
    ) -> Self {
        Self {
            provider_name: provider_name.into(),
            caption: caption.into(),
            raw_payload,
            metadata,
            fallback_used: false,
            original_provider_name: None,
            fallback_reason: None,
        }
    }
}

/// Outcome of normalizing and validating one raw payload.
///
/// Transient; its fields flow into the record the caller stores. On
/// failure `document` holds the original unvalidated document so a degraded
/// caption is never discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// Cleaned document on success, the unmodified normalized document on
    /// failure
    pub document: Value,

    /// Whether the document satisfied the category schema
    pub is_valid: bool,

    /// Concatenated, path-qualified violation messages when invalid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// The composite record handed back to the caller after generate + validate.
///
/// The caller owns persistence; this core performs no storage I/O.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    /// Category the request was validated against
    pub category: Category,

    /// Cleaned (valid) or raw (invalid) canonical document
    pub document: Value,

    /// Whether the document passed schema validation
    pub is_valid: bool,

    /// Validation diagnostics when invalid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Provider that served the request
    pub provider_name: String,

    /// Whether fallback was used
    pub fallback_used: bool,

    /// Originally-selected provider when fallback was used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_provider_name: Option<String>,

    /// Why the original provider failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}
