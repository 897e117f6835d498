//! Photo classification: zero-shot labels and their categories.

use anyhow::{Context, Result};

use super::models::{ClassifiedImage, ImageCategory};
use crate::kernel::{BaseImageClassifier, ImageInput};

/// Labels that mean the photo shows the property itself
pub const HOUSE_LABELS: &[&str] = &[
    "a photo of a house",
    "a photo of a kitchen",
    "a living room interior",
    "a bathroom interior",
    "a bedroom",
    "a floorplan",
    "a building exterior",
    "an office",
    "abstract art",
];

pub const LOGO_LABELS: &[&str] = &["a logo"];

pub const PERSON_LABELS: &[&str] = &["a person", "headshot"];

/// Every label the classifier may choose from, house labels first.
pub fn candidate_labels() -> Vec<&'static str> {
    HOUSE_LABELS
        .iter()
        .chain(LOGO_LABELS)
        .chain(PERSON_LABELS)
        .copied()
        .collect()
}

impl ImageCategory {
    /// Category for a fine-grained label, `None` if the label is unknown.
    pub fn from_label(label: &str) -> Option<Self> {
        if HOUSE_LABELS.contains(&label) {
            Some(ImageCategory::House)
        } else if LOGO_LABELS.contains(&label) {
            Some(ImageCategory::Logo)
        } else if PERSON_LABELS.contains(&label) {
            Some(ImageCategory::Person)
        } else {
            None
        }
    }
}

/// Classify each image in upload order. Any failure aborts the whole batch.
pub async fn classify_images(
    classifier: &dyn BaseImageClassifier,
    images: &[ImageInput],
) -> Result<Vec<ClassifiedImage>> {
    let labels = candidate_labels();
    let mut classified = Vec::with_capacity(images.len());

    for image in images {
        let verdict = classifier
            .classify(image, &labels)
            .await
            .with_context(|| format!("Failed to classify image {}", image.reference))?;

        let category = ImageCategory::from_label(&verdict.label).ok_or_else(|| {
            anyhow::anyhow!(
                "Classifier returned unknown label '{}' for {}",
                verdict.label,
                image.reference
            )
        })?;

        tracing::debug!(
            image = %image.reference,
            label = %verdict.label,
            score = verdict.score,
            category = %category,
            "Classified image"
        );

        classified.push(ClassifiedImage {
            reference: image.reference.clone(),
            label: verdict.label,
            score: verdict.score,
            category,
        });
    }

    Ok(classified)
}
