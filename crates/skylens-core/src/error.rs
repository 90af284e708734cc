//! Error types for the Skylens analysis pipeline.
//!
//! Errors are organized by subsystem. Provider failures are deliberately a
//! single uniform class (`ProviderError::Unavailable`) so the orchestrator
//! can treat every backend identically when deciding to fall back. Schema
//! validation failures are NOT represented here: malformed model output is
//! a routine outcome carried in `ValidationOutcome`, not an error.

use thiserror::Error;

use crate::analysis::redact;

/// Top-level error type for Skylens operations.
#[derive(Error, Debug)]
pub enum SkylensError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Analysis orchestration errors
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// Schema lookup errors
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// The single recoverable provider error class.
///
/// Every upstream condition a backend can recover from by falling back to a
/// different backend (quota, auth, timeout, transport, malformed envelope)
/// maps to `Unavailable`. The reason string is redacted at construction so
/// upstream secrets never cross the provider boundary.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The provider could not produce any result for this request
    #[error("provider '{provider}' unavailable: {reason}")]
    Unavailable { provider: String, reason: String },
}

impl ProviderError {
    /// Build an `Unavailable` error, redacting secrets from the reason text.
    pub fn unavailable(provider: impl Into<String>, reason: impl AsRef<str>) -> Self {
        Self::Unavailable {
            provider: provider.into(),
            reason: redact(reason.as_ref()),
        }
    }

    /// The name of the provider that failed.
    pub fn provider(&self) -> &str {
        match self {
            Self::Unavailable { provider, .. } => provider,
        }
    }

    /// The sanitized failure reason.
    pub fn reason(&self) -> &str {
        match self {
            Self::Unavailable { reason, .. } => reason,
        }
    }
}

/// Terminal orchestration errors.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// No provider was registered at all
    #[error("no analysis providers are registered")]
    NoProvidersRegistered,

    /// Every registered provider was tried and failed
    #[error("all {attempted} providers failed; last error: {last_reason}")]
    AllProvidersFailed { attempted: usize, last_reason: String },

    /// Input image exceeds the configured size limit
    #[error("image too large: {size_bytes} bytes (limit {max_bytes})")]
    ImageTooLarge { size_bytes: u64, max_bytes: u64 },
}

/// Schema lookup errors.
///
/// Distinct from validation failure: without a schema the caller cannot know
/// which contract to honor, so these are hard errors and not retried.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// No schema exists for the requested category
    #[error("no schema registered for category '{category}'")]
    NotFound { category: String },

    /// The backing store could not be read
    #[error("schema store error: {message}")]
    Store { message: String },
}

/// Availability lookup failure against the durable store.
///
/// Selection degrades to local provider hints when this occurs; it is never
/// surfaced to the end caller.
#[derive(Error, Debug)]
#[error("availability lookup failed: {message}")]
pub struct AvailabilityError {
    pub message: String,
}

impl AvailabilityError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Convenience type alias for Skylens results.
pub type Result<T> = std::result::Result<T, SkylensError>;
