//! Analysis provider trait and request types.
//!
//! Defines the interface every analysis backend implements, plus the
//! factory that builds the registered provider set from configuration.

use crate::config::Config;
use crate::error::ProviderError;
use crate::types::{ProviderDescriptor, ProviderFamily};
use async_trait::async_trait;
use base64::Engine;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::anthropic::AnthropicProvider;
use super::manual::ManualProvider;
use super::openai::OpenAiProvider;
use super::stub::StubProvider;

/// Base64-encoded image ready to send to an analysis backend.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Base64-encoded image bytes
    pub data: String,
    /// MIME type (e.g., "image/jpeg", "image/png")
    pub media_type: String,
}

impl ImageInput {
    /// Create an `ImageInput` from raw bytes.
    ///
    /// The media type is sniffed from the file signature. Unrecognized
    /// signatures default to JPEG with a warning.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let media_type = sniff_media_type(bytes).unwrap_or_else(|| {
            tracing::warn!("Unrecognized image signature, defaulting to image/jpeg");
            "image/jpeg"
        });

        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: media_type.to_string(),
        }
    }

    /// Return a data URL suitable for OpenAI-style APIs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// Sniff the MIME type from image magic bytes.
fn sniff_media_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() < 4 {
        return None;
    }
    // JPEG: FF D8 FF
    if bytes[0] == 0xFF && bytes[1] == 0xD8 && bytes[2] == 0xFF {
        return Some("image/jpeg");
    }
    // PNG: 89 50 4E 47
    if bytes[0] == 0x89 && bytes[1] == b'P' && bytes[2] == b'N' && bytes[3] == b'G' {
        return Some("image/png");
    }
    // GIF: GIF8
    if bytes[0] == b'G' && bytes[1] == b'I' && bytes[2] == b'F' && bytes[3] == b'8' {
        return Some("image/gif");
    }
    // WebP: RIFF....WEBP
    if bytes.len() >= 12
        && &bytes[0..4] == b"RIFF"
        && &bytes[8..12] == b"WEBP"
    {
        return Some("image/webp");
    }
    None
}

/// A request to analyze one image.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// The image to analyze
    pub image: ImageInput,
    /// Text prompt for the model
    pub prompt: String,
    /// Instructions describing the metadata fields to extract
    pub metadata_instructions: String,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl AnalysisRequest {
    /// Build a request with default generation settings.
    pub fn new(
        image: ImageInput,
        prompt: impl Into<String>,
        metadata_instructions: impl Into<String>,
    ) -> Self {
        Self {
            image,
            prompt: prompt.into(),
            metadata_instructions: metadata_instructions.into(),
            max_tokens: 1024,
            temperature: 0.2,
        }
    }

    /// Prompt with the metadata instructions appended, for backends that
    /// take a single text block.
    pub fn combined_prompt(&self) -> String {
        if self.metadata_instructions.is_empty() {
            self.prompt.clone()
        } else {
            format!("{}\n\n{}", self.prompt, self.metadata_instructions)
        }
    }
}

/// Trait that all analysis providers implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (we need `Arc<dyn AnalysisProvider>` for dynamic dispatch).
///
/// Implementations never fail on recoverable upstream errors with anything
/// other than `ProviderError::Unavailable`, and they treat parseable but
/// semantically empty output as success: an empty caption is still a
/// result, while `Unavailable` is reserved for transport, auth, and
/// capacity failures.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Provider name for registry lookup and logging (e.g., "openai").
    fn name(&self) -> &str;

    /// Capability family tag.
    fn family(&self) -> ProviderFamily;

    /// Snapshot descriptor for diagnostics.
    fn describe(&self) -> ProviderDescriptor;

    /// Local availability hint, used when the durable availability lookup
    /// is unreachable.
    async fn is_available(&self) -> bool;

    /// Produce a structured analysis for the given request.
    async fn generate(&self, request: &AnalysisRequest)
        -> Result<crate::types::AnalysisResult, ProviderError>;

    /// Per-request timeout for this provider.
    fn timeout(&self) -> Duration;
}

/// Map an upstream HTTP failure status onto an `Unavailable` reason.
///
/// The body snippet is truncated and redacted by the error constructor.
pub(crate) fn unavailable_for_status(
    provider: &str,
    status: u16,
    body: &str,
) -> ProviderError {
    let snippet: String = body.chars().take(300).collect();
    let reason = match status {
        401 | 403 => format!("authentication rejected (HTTP {status}): {snippet}"),
        429 => format!("rate limited (HTTP {status}): {snippet}"),
        500..=599 => format!("upstream unavailable (HTTP {status}): {snippet}"),
        _ => format!("HTTP {status}: {snippet}"),
    };
    ProviderError::unavailable(provider, reason)
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok()
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Build the registered provider set from configuration.
///
/// Registration order is hosted providers first, then stub, then manual, so
/// the sequential fallback walk reaches the guaranteed backends last. A
/// hosted provider whose credential does not resolve is skipped, not an
/// error.
pub fn build_providers(config: &Config) -> Vec<Arc<dyn AnalysisProvider>> {
    let mut providers: Vec<Arc<dyn AnalysisProvider>> = Vec::new();
    let timeout = Duration::from_millis(config.limits.hosted_timeout_ms);

    if let Some(cfg) = &config.providers.openai {
        match resolve_env_var(&cfg.api_key) {
            Some(api_key) => providers.push(Arc::new(OpenAiProvider::new(
                &cfg.endpoint,
                &api_key,
                &cfg.model,
                timeout,
            ))),
            None => tracing::debug!("OpenAI API key not set; provider not registered"),
        }
    }

    if let Some(cfg) = &config.providers.anthropic {
        match resolve_env_var(&cfg.api_key) {
            Some(api_key) => providers.push(Arc::new(AnthropicProvider::new(
                &api_key, &cfg.model, timeout,
            ))),
            None => tracing::debug!("Anthropic API key not set; provider not registered"),
        }
    }

    if config.providers.stub {
        providers.push(Arc::new(StubProvider::new()));
    }
    if config.providers.manual {
        providers.push(Arc::new(ManualProvider::new()));
    }

    providers
}

/// Shared helper: metadata map from a parsed payload, for providers that
/// assemble results by hand.
pub(crate) fn metadata_of(payload: &Value) -> serde_json::Map<String, Value> {
    payload
        .get("metadata")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}
