// AI implementation using OpenAI
//
// This is the infrastructure implementation of BaseAI.
// Business logic (what to prompt for) lives in domain layers.

use anyhow::{Context, Result};
use async_trait::async_trait;
use openai_client::{ChatRequest, Message, OpenAIClient};

use super::BaseAI;

/// Sampling temperature for extraction; low so field values stay literal
const EXTRACTION_TEMPERATURE: f32 = 0.3;

/// OpenAI chat completions behind the BaseAI trait
#[derive(Clone)]
pub struct OpenAIChat {
    client: OpenAIClient,
    model: String,
}

impl OpenAIChat {
    pub fn new(client: OpenAIClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    fn request(&self, prompt: &str) -> ChatRequest {
        ChatRequest::new(&self.model)
            .message(Message::user(prompt))
            .temperature(EXTRACTION_TEMPERATURE)
    }
}

#[async_trait]
impl BaseAI for OpenAIChat {
    async fn complete(&self, prompt: &str) -> Result<String> {
        tracing::debug!(
            prompt_length = prompt.len(),
            model = %self.model,
            "Calling OpenAI chat completion"
        );

        let response = self
            .client
            .chat_completion(self.request(prompt))
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    model = %self.model,
                    prompt_preview = %prompt.chars().take(200).collect::<String>(),
                    "OpenAI API call failed"
                );
                e
            })
            .context("Failed to call OpenAI API")?;

        Ok(response.content)
    }

    async fn complete_json(&self, prompt: &str) -> Result<String> {
        let response = self
            .client
            .chat_completion(self.request(prompt).json_object())
            .await
            .context("Failed to call OpenAI API in JSON mode")?;

        tracing::info!(
            response_length = response.content.len(),
            model = %self.model,
            "OpenAI JSON response received"
        );

        Ok(response.content)
    }
}
