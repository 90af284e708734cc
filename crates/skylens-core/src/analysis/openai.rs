//! OpenAI-compatible analysis provider using the Chat Completions API.
//!
//! Sends the image via data URL in the user message content array and
//! extracts the structured envelope from the returned text.

use super::envelope;
use super::provider::{unavailable_for_status, AnalysisProvider, AnalysisRequest};
use crate::error::ProviderError;
use crate::types::{AnalysisResult, ProviderDescriptor, ProviderFamily};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// OpenAI-compatible provider using the Chat Completions API.
pub struct OpenAiProvider {
    endpoint: String,
    api_key: String,
    model: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(endpoint: &str, api_key: &str, model: &str, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            timeout,
            client: reqwest::Client::new(),
        }
    }
}

// --- Request types ---

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ChatContent>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ChatContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

// --- Response types ---

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl AnalysisProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
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
        let body = ChatRequest {
            model: self.model.clone(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: vec![
                    ChatContent::ImageUrl {
                        image_url: ImageUrl {
                            url: request.image.data_url(),
                        },
                    },
                    ChatContent::Text {
                        text: request.combined_prompt(),
                    },
                ],
            }],
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
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

        let chat_resp: ChatResponse = resp.json().await.map_err(|e| {
            ProviderError::unavailable(self.name(), format!("malformed response envelope: {e}"))
        })?;

        // Empty choices or content means the upstream answered but produced
        // nothing; that is still a result, not a failure.
        let text = chat_resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        Ok(envelope::result_from_text(self.name(), text.trim()))
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}
