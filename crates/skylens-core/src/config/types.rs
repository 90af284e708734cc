//! Sub-configuration structs with defaults.

use serde::{Deserialize, Serialize};

use crate::types::AvailabilityRecord;

/// Orchestrator selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Provider used when the caller names none. "random" selects among
    /// available providers per request.
    pub default_provider: String,

    /// Static availability records, standing in for the durable store when
    /// no external lookup is wired up.
    pub availability: Vec<AvailabilityEntry>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            default_provider: "random".to_string(),
            availability: Vec::new(),
        }
    }
}

/// One static availability record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AvailabilityEntry {
    /// Registered provider name
    pub name: String,

    /// Eligible for random selection
    pub available: bool,

    /// Preferred provider when the candidate pool is empty
    pub fallback_default: bool,
}

impl Default for AvailabilityEntry {
    fn default() -> Self {
        Self {
            name: String::new(),
            available: true,
            fallback_default: false,
        }
    }
}

impl AvailabilityEntry {
    /// Convert into the record shape the orchestrator consumes.
    pub fn to_record(&self) -> AvailabilityRecord {
        AvailabilityRecord {
            name: self.name.clone(),
            is_available: self.available,
            is_fallback_default: self.fallback_default,
        }
    }
}

/// Resource limits to protect against problematic inputs and slow upstreams.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum input image size in bytes
    pub max_image_bytes: u64,

    /// Hosted provider call timeout in milliseconds
    pub hosted_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: 20 * 1024 * 1024,
            hosted_timeout_ms: 60_000,
        }
    }
}

/// Analysis provider configurations.
///
/// A hosted provider whose API key does not resolve is simply not
/// registered; absence of a credential is not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Register the deterministic placeholder provider
    pub stub: bool,

    /// Register the empty-result manual provider
    pub manual: bool,

    /// OpenAI-compatible Chat Completions configuration
    pub openai: Option<OpenAiConfig>,

    /// Anthropic Messages API configuration
    pub anthropic: Option<AnthropicConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            stub: true,
            manual: true,
            openai: Some(OpenAiConfig::default()),
            anthropic: Some(AnthropicConfig::default()),
        }
    }
}

/// OpenAI-compatible endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API endpoint
    pub endpoint: String,

    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: "${OPENAI_API_KEY}".to_string(),
            model: "gpt-4o".to_string(),
        }
    }
}

/// Anthropic configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: "${ANTHROPIC_API_KEY}".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
        }
    }
}

/// Schema store settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SchemasConfig {
    /// Directory of per-category schema JSON files. When unset, the
    /// built-in schemas are used.
    pub dir: Option<String>,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
