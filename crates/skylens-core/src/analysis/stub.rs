//! Deterministic placeholder provider.
//!
//! Always succeeds with a fixed canonical document. Serves as the
//! guaranteed last-resort fallback and as a test double in integration
//! setups with no credentials configured.

use super::provider::{metadata_of, AnalysisProvider, AnalysisRequest};
use crate::error::ProviderError;
use crate::types::{AnalysisResult, ProviderDescriptor, ProviderFamily};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

/// Caption carried by every stub result.
pub const STUB_CAPTION: &str =
    "Automated analysis unavailable; placeholder description generated.";

/// Provider that always succeeds with a deterministic placeholder.
#[derive(Debug, Default)]
pub struct StubProvider;

impl StubProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AnalysisProvider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    fn family(&self) -> ProviderFamily {
        ProviderFamily::Stub
    }

    fn describe(&self) -> ProviderDescriptor {
        ProviderDescriptor {
            name: self.name().to_string(),
            family: self.family(),
            available_hint: true,
        }
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn generate(
        &self,
        _request: &AnalysisRequest,
    ) -> Result<AnalysisResult, ProviderError> {
        let payload = json!({
            "description": STUB_CAPTION,
            "analysis": "",
            "recommended_actions": "",
            "metadata": {},
        });
        let metadata = metadata_of(&payload);
        Ok(AnalysisResult::new(self.name(), STUB_CAPTION, payload, metadata))
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(5)
    }
}
