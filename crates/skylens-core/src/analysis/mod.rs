//! Analysis backends for crisis-map and drone imagery.
//!
//! Provides a provider abstraction over multiple vision-language backends
//! (OpenAI-compatible, Anthropic, plus local stub/manual backends) and the
//! orchestrator that selects one per request and cascades on failure.

pub(crate) mod anthropic;
pub(crate) mod envelope;
pub(crate) mod manual;
pub(crate) mod openai;
pub(crate) mod orchestrator;
pub(crate) mod provider;
pub(crate) mod redact;
pub(crate) mod stub;

pub use anthropic::AnthropicProvider;
pub use envelope::{extract_json, strip_code_fence};
pub use manual::ManualProvider;
pub use openai::OpenAiProvider;
pub use orchestrator::{
    AvailabilityLookup, Orchestrator, StaticAvailability, RANDOM_PROVIDER,
};
pub use provider::{
    build_providers, resolve_env_var, AnalysisProvider, AnalysisRequest, ImageInput,
};
pub use redact::redact;
pub use stub::{StubProvider, STUB_CAPTION};
