//! Manual provider: every field empty, the operator fills the record in.
//!
//! Only reachable by explicit name; random selection never picks a
//! manual-family provider.

use super::provider::{AnalysisProvider, AnalysisRequest};
use crate::error::ProviderError;
use crate::types::{AnalysisResult, ProviderDescriptor, ProviderFamily};
use async_trait::async_trait;
use serde_json::{json, Map};
use std::time::Duration;

/// Provider that always succeeds with an all-empty canonical document.
#[derive(Debug, Default)]
pub struct ManualProvider;

impl ManualProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AnalysisProvider for ManualProvider {
    fn name(&self) -> &str {
        "manual"
    }

    fn family(&self) -> ProviderFamily {
        ProviderFamily::Manual
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
            "description": "",
            "analysis": "",
            "recommended_actions": "",
            "metadata": {},
        });
        Ok(AnalysisResult::new(self.name(), "", payload, Map::new()))
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(5)
    }
}
