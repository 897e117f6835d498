//! Image classification through an OpenAI vision model.
//!
//! The model is shown the image and forced, through a strict JSON schema, to
//! answer with one of the candidate labels plus a confidence score.

use anyhow::{Context, Result};
use async_trait::async_trait;
use openai_client::{ChatRequest, ContentPart, ImageUrl, Message, OpenAIClient};
use serde::Deserialize;
use serde_json::json;

use super::{BaseImageClassifier, ImageInput, ImageLabel, ImageSource};

const SYSTEM_PROMPT: &str = "You are an image classifier for real estate marketing material. \
Look at the image and choose the single label that describes it best. \
Answer only with the requested JSON.";

#[derive(Debug, Deserialize)]
struct Verdict {
    label: String,
    confidence: f32,
}

/// Zero-shot image classifier backed by an OpenAI vision model
#[derive(Clone)]
pub struct OpenAIVisionClassifier {
    client: OpenAIClient,
    model: String,
}

impl OpenAIVisionClassifier {
    pub fn new(client: OpenAIClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    fn request(&self, image: &ImageInput, labels: &[&str]) -> ChatRequest {
        let image_url = match &image.source {
            ImageSource::Bytes(bytes) => ImageUrl::from_bytes(&image.content_type, bytes),
            ImageSource::Url(url) => ImageUrl::remote(url),
        };
        let label_list = labels
            .iter()
            .map(|l| format!("- {}", l))
            .collect::<Vec<_>>()
            .join("\n");

        ChatRequest::new(&self.model)
            .message(Message::system(SYSTEM_PROMPT))
            .message(Message::user_parts(vec![
                ContentPart::text(format!("Candidate labels:\n{}", label_list)),
                ContentPart::image(image_url.with_detail("low")),
            ]))
            .temperature(0.0)
            .json_schema("image_label", label_schema(labels))
    }
}

/// Strict-mode schema restricting `label` to the candidate set.
fn label_schema(labels: &[&str]) -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "label": { "type": "string", "enum": labels },
            "confidence": { "type": "number" }
        },
        "required": ["label", "confidence"],
        "additionalProperties": false
    })
}

#[async_trait]
impl BaseImageClassifier for OpenAIVisionClassifier {
    async fn classify(&self, image: &ImageInput, labels: &[&str]) -> Result<ImageLabel> {
        if labels.is_empty() {
            anyhow::bail!("No candidate labels given for {}", image.reference);
        }

        let value = self
            .client
            .chat_json(self.request(image, labels))
            .await
            .with_context(|| format!("Vision classification failed for {}", image.reference))?;

        let verdict: Verdict = serde_json::from_value(value)
            .with_context(|| format!("Unexpected classifier answer for {}", image.reference))?;

        if !labels.contains(&verdict.label.as_str()) {
            anyhow::bail!(
                "Classifier answered unknown label '{}' for {}",
                verdict.label,
                image.reference
            );
        }

        tracing::debug!(
            image = %image.reference,
            label = %verdict.label,
            confidence = verdict.confidence,
            model = %self.model,
            "Image classified"
        );

        Ok(ImageLabel {
            label: verdict.label,
            score: verdict.confidence.clamp(0.0, 1.0),
        })
    }
}
