// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// What to prompt for and which labels exist live in the domain layer.
//
// Naming convention: Base* for trait names (e.g., BaseAI, BaseImageClassifier)

use anyhow::Result;
use async_trait::async_trait;

// =============================================================================
// AI Trait (Infrastructure - Generic LLM capabilities)
// =============================================================================

#[async_trait]
pub trait BaseAI: Send + Sync {
    /// Complete a prompt with an LLM (returns raw text response)
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Complete a prompt expecting JSON response (returns raw JSON string)
    /// Parse with serde_json::from_str in calling code
    async fn complete_json(&self, prompt: &str) -> Result<String> {
        self.complete(prompt).await
    }
}

// =============================================================================
// Image Classifier Trait (Infrastructure - pretrained vision model)
// =============================================================================

/// Where the bytes of an image come from.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// Uploaded file contents
    Bytes(Vec<u8>),
    /// Publicly reachable URL the model fetches itself
    Url(String),
}

/// One image submitted for classification.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInput {
    /// Filename or URL; this is what ends up in template slots
    pub reference: String,
    pub content_type: String,
    pub source: ImageSource,
}

impl ImageInput {
    pub fn upload(reference: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            reference: reference.into(),
            content_type: content_type.into(),
            source: ImageSource::Bytes(bytes),
        }
    }

    pub fn url(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            reference: url.clone(),
            content_type: String::new(),
            source: ImageSource::Url(url),
        }
    }
}

/// Label chosen by a classifier, with its confidence in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct ImageLabel {
    pub label: String,
    pub score: f32,
}

#[async_trait]
pub trait BaseImageClassifier: Send + Sync {
    /// Pick the best matching label for the image among `labels`
    async fn classify(&self, image: &ImageInput, labels: &[&str]) -> Result<ImageLabel>;
}
