//! The caller-facing analysis service.
//!
//! Composes orchestrated generation with schema validation: one call takes
//! image bytes + prompts + category and returns the record the caller
//! persists. No storage I/O happens here.

use std::sync::Arc;

use crate::analysis::{AnalysisRequest, ImageInput, Orchestrator};
use crate::config::LimitsConfig;
use crate::error::{AnalysisError, SkylensError};
use crate::schema::SchemaRegistry;
use crate::types::{AnalysisRecord, Category};
use crate::validate::clean_and_validate;

/// Orchestrator + schema registry behind one entry point.
pub struct AnalysisService {
    orchestrator: Arc<Orchestrator>,
    schemas: Arc<SchemaRegistry>,
    max_image_bytes: u64,
}

impl AnalysisService {
    pub fn new(orchestrator: Arc<Orchestrator>, schemas: Arc<SchemaRegistry>) -> Self {
        Self::with_limits(orchestrator, schemas, &LimitsConfig::default())
    }

    pub fn with_limits(
        orchestrator: Arc<Orchestrator>,
        schemas: Arc<SchemaRegistry>,
        limits: &LimitsConfig,
    ) -> Self {
        Self {
            orchestrator,
            schemas,
            max_image_bytes: limits.max_image_bytes,
        }
    }

    /// Analyze one image and validate the result against its category schema.
    ///
    /// The schema is fetched before any provider is called: without the
    /// contract there is nothing to validate against, and failing early
    /// avoids spending upstream quota. A provider success whose output
    /// fails validation is still a success; the record carries
    /// `is_valid = false` plus diagnostics and the caller decides.
    pub async fn analyze(
        &self,
        image_bytes: &[u8],
        prompt: &str,
        metadata_instructions: &str,
        model_name: Option<&str>,
        category: &Category,
    ) -> Result<AnalysisRecord, SkylensError> {
        let schema = self.schemas.get(category).await?;

        let size = image_bytes.len() as u64;
        if size > self.max_image_bytes {
            return Err(AnalysisError::ImageTooLarge {
                size_bytes: size,
                max_bytes: self.max_image_bytes,
            }
            .into());
        }

        let request = AnalysisRequest::new(
            ImageInput::from_bytes(image_bytes),
            prompt,
            metadata_instructions,
        );
        let result = self.orchestrator.generate(&request, model_name).await?;

        let outcome = clean_and_validate(&result.raw_payload, &schema);
        if !outcome.is_valid {
            tracing::info!(
                provider = %result.provider_name,
                category = %category,
                "analysis stored-with-flag: output failed schema validation"
            );
        }

        Ok(AnalysisRecord {
            category: category.clone(),
            document: outcome.document,
            is_valid: outcome.is_valid,
            error_message: outcome.error_message,
            provider_name: result.provider_name,
            fallback_used: result.fallback_used,
            original_provider_name: result.original_provider_name,
            fallback_reason: result.fallback_reason,
        })
    }
}
