//! Anthropic analysis provider using the Messages API.
//!
//! Sends image + prompt via base64 image content blocks and extracts the
//! structured envelope from the returned text.

use super::envelope;
use super::provider::{unavailable_for_status, AnalysisProvider, AnalysisRequest};
use crate::error::ProviderError;
use crate::types::{AnalysisResult, ProviderDescriptor, ProviderFamily};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Anthropic provider using the Messages API.
pub struct AnthropicProvider {
    api_key: String,
    model: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            timeout,
            client: reqwest::Client::new(),
        }
    }
}

// --- Request types ---

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: Vec<ContentBlock>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "image")]
    Image { source: ImageSource },
    #[serde(rename = "text")]
    Text { text: String },
}

#[derive(Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    source_type: String,
    media_type: String,
    data: String,
}

// --- Response types ---

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    text: Option<String>,
}

#[async_trait]
impl AnalysisProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn family(&self) -> ProviderFamily {
        ProviderFamily::Hosted
    }

    fn describe(&self) -> ProviderDescriptor {
        ProviderDescriptor {
            name: self.name().to_string(),
            family: self.family(),
            available_hint: !self.api_key.is_empty(),
        }
    }

    async fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn generate(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, ProviderError> {
        let body = MessagesRequest {
            model: self.model.clone(),
            max_tokens: request.max_tokens,
            temperature: Some(request.temperature),
            messages: vec![Message {
                role: "user".to_string(),
                content: vec![
                    ContentBlock::Image {
                        source: ImageSource {
                            source_type: "base64".to_string(),
                            media_type: request.image.media_type.clone(),
                            data: request.image.data.clone(),
                        },
                    },
                    ContentBlock::Text {
                        text: request.combined_prompt(),
                    },
                ],
            }],
        };

        let resp = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::unavailable(
                        self.name(),
                        format!("request timed out after {:?}", self.timeout),
                    )
                } else {
                    ProviderError::unavailable(self.name(), format!("request failed: {e}"))
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(unavailable_for_status(self.name(), status.as_u16(), &text));
        }

        let messages_resp: MessagesResponse = resp.json().await.map_err(|e| {
            ProviderError::unavailable(self.name(), format!("malformed response envelope: {e}"))
        })?;

        let text = messages_resp
            .content
            .into_iter()
            .filter_map(|c| c.text)
            .collect::<Vec<_>>()
            .join("");

        Ok(envelope::result_from_text(self.name(), text.trim()))
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}
