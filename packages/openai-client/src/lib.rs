//! Pure OpenAI REST API client
//!
//! A small client for the chat completions endpoint with no domain-specific
//! logic. Supports plain completions, JSON-object and JSON-schema constrained
//! output, and image inputs for vision models.
//!
//! # Example
//!
//! ```rust,ignore
//! use openai_client::{ChatRequest, ContentPart, ImageUrl, Message, OpenAIClient};
//!
//! let client = OpenAIClient::from_env()?;
//!
//! // Text completion
//! let response = client
//!     .chat_completion(ChatRequest::new("gpt-4o-mini").message(Message::user("Hello!")))
//!     .await?;
//!
//! // Vision
//! let response = client
//!     .chat_completion(ChatRequest::new("gpt-4o-mini").message(Message::user_parts(vec![
//!         ContentPart::text("Describe this photo"),
//!         ContentPart::image(ImageUrl::remote("https://example.com/house.jpg")),
//!     ])))
//!     .await?;
//! ```

pub mod error;
pub mod types;

pub use error::{OpenAIError, Result};
pub use types::*;

use reqwest::Client;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Pure OpenAI API client.
#[derive(Clone)]
pub struct OpenAIClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAIClient {
    /// Create a new OpenAI client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create from environment variable `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| OpenAIError::Config("OPENAI_API_KEY not set".into()))?;
        if api_key.trim().is_empty() {
            return Err(OpenAIError::Config("OPENAI_API_KEY is empty".into()));
        }
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Chat completion.
    ///
    /// Send messages to the chat completion API and get the first choice back.
    pub async fn chat_completion(&self, request: ChatRequest) -> Result<ChatResponse> {
        let start = std::time::Instant::now();

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, model = %request.model, "OpenAI request failed");
                OpenAIError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "OpenAI API error");
            return Err(OpenAIError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let chat_response: types::ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| OpenAIError::Parse(e.to_string()))?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(OpenAIError::EmptyResponse)?;

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis(),
            response_length = content.len(),
            "OpenAI chat completion"
        );

        Ok(ChatResponse {
            content,
            usage: chat_response.usage,
        })
    }

    /// Chat completion whose answer must be a single JSON value.
    ///
    /// Strips markdown fences the model may add and parses the result.
    pub async fn chat_json(&self, request: ChatRequest) -> Result<serde_json::Value> {
        let response = self.chat_completion(request).await?;
        serde_json::from_str(strip_code_blocks(&response.content))
            .map_err(|e| OpenAIError::Parse(format!("Model did not return valid JSON: {}", e)))
    }
}
