//! Listing composition: extract, classify, match.

use thiserror::Error;

use super::classification::classify_images;
use super::extraction::{extract_fields, requested_fields};
use super::models::{ClassifiedImage, ExtractedFields, ListingSubmission};
use crate::domains::templates::matcher::{match_template, MatchError, MatchResult};
use crate::domains::templates::models::Template;
use crate::kernel::ServerDeps;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("text extraction failed: {0:#}")]
    Extraction(anyhow::Error),

    #[error("image classification failed: {0:#}")]
    Classification(anyhow::Error),

    #[error(transparent)]
    NoMatch(#[from] MatchError),

    #[error("failed to load templates: {0:#}")]
    Storage(anyhow::Error),
}

/// Outcome of one `/select-template/` call. Never persisted.
#[derive(Debug, Clone)]
pub struct ComposedListing {
    pub result: MatchResult,
    pub classified_images: Vec<ClassifiedImage>,
    pub extracted: ExtractedFields,
}

/// Run a submission through the extractor, the classifier and the matcher.
///
/// Fails fast without calling either model when no template is stored.
pub async fn compose_listing(
    submission: &ListingSubmission,
    deps: &ServerDeps,
) -> Result<ComposedListing, ComposeError> {
    let templates = Template::find_all(&deps.db_pool)
        .await
        .map_err(ComposeError::Storage)?;
    if templates.is_empty() {
        tracing::info!("No templates stored; nothing to match against");
        return Err(MatchError::NoMatchingTemplate.into());
    }

    let fields = requested_fields(&templates);
    let extracted = extract_fields(
        deps.ai.as_ref(),
        &fields,
        &submission.text,
        deps.max_field_length,
    )
    .await
    .map_err(ComposeError::Extraction)?;

    let classified_images = classify_images(deps.image_classifier.as_ref(), &submission.images)
        .await
        .map_err(ComposeError::Classification)?;

    let result = match_template(
        &templates,
        &classified_images,
        &extracted,
        &submission.realtor,
    )?;

    tracing::info!(
        template = %result.template_name,
        images = classified_images.len(),
        fields = extracted.len(),
        "Composed listing"
    );

    Ok(ComposedListing {
        result,
        classified_images,
        extracted,
    })
}
