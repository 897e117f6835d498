// Mock implementations for testing
//
// Provides mock services that can be injected into ServerDeps for tests.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{BaseAI, BaseImageClassifier, ImageInput, ImageLabel};

// =============================================================================
// Mock AI (Generic LLM capabilities)
// =============================================================================

pub struct MockAI {
    responses: Arc<Mutex<Vec<String>>>,
    calls: Arc<Mutex<Vec<String>>>,
    failure: Option<String>,
}

impl MockAI {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            failure: None,
        }
    }

    /// A mock whose every call fails with the given message
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new()
        }
    }

    /// Add a text response to the queue
    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.responses.lock().unwrap().push(response.into());
        self
    }

    /// Add a JSON response to the queue (will be serialized)
    pub fn with_json_response<T: serde::Serialize>(self, data: &T) -> Self {
        let json = serde_json::to_string(data).expect("Failed to serialize mock response");
        self.responses.lock().unwrap().push(json);
        self
    }

    /// Get all prompts that were sent to the AI
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Get the last prompt sent to the AI
    pub fn last_prompt(&self) -> Option<String> {
        self.calls.lock().unwrap().last().cloned()
    }

    /// Get the number of times the AI was called
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for MockAI {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseAI for MockAI {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.calls.lock().unwrap().push(prompt.to_string());

        if let Some(message) = &self.failure {
            anyhow::bail!("{}", message);
        }

        let mut responses = self.responses.lock().unwrap();
        if !responses.is_empty() {
            Ok(responses.remove(0))
        } else {
            // Empty object: nothing extracted
            Ok("{}".to_string())
        }
    }
}

// =============================================================================
// Mock Image Classifier
// =============================================================================

pub struct MockImageClassifier {
    labels: Arc<Mutex<HashMap<String, String>>>,
    default_label: Option<String>,
    calls: Arc<Mutex<Vec<String>>>,
    failure: Option<String>,
}

impl MockImageClassifier {
    pub fn new() -> Self {
        Self {
            labels: Arc::new(Mutex::new(HashMap::new())),
            default_label: None,
            calls: Arc::new(Mutex::new(Vec::new())),
            failure: None,
        }
    }

    /// A mock whose every call fails with the given message
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new()
        }
    }

    /// Answer `label` for the image with this filename or URL
    pub fn with_label(self, reference: &str, label: &str) -> Self {
        self.labels
            .lock()
            .unwrap()
            .insert(reference.to_string(), label.to_string());
        self
    }

    /// Answer `label` for any image without an explicit label
    pub fn with_default_label(mut self, label: &str) -> Self {
        self.default_label = Some(label.to_string());
        self
    }

    /// References of all images that were classified, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockImageClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseImageClassifier for MockImageClassifier {
    async fn classify(&self, image: &ImageInput, labels: &[&str]) -> Result<ImageLabel> {
        self.calls.lock().unwrap().push(image.reference.clone());

        if let Some(message) = &self.failure {
            anyhow::bail!("{}", message);
        }

        let label = self
            .labels
            .lock()
            .unwrap()
            .get(&image.reference)
            .cloned()
            .or_else(|| self.default_label.clone())
            .or_else(|| labels.first().map(|l| l.to_string()))
            .ok_or_else(|| anyhow::anyhow!("No label for {}", image.reference))?;

        Ok(ImageLabel { label, score: 0.9 })
    }
}
