//! Listing submission: fill the best template with the submitted content.

use axum::{
    extract::{multipart::Field, Extension, Multipart},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domains::listings::{
    compose_listing, ClassifiedImage, ExtractedFields, ListingSubmission, RealtorContact,
};
use crate::kernel::ImageInput;
use crate::server::app::AppState;
use crate::server::error::ApiError;

const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

#[derive(Debug, Serialize, Deserialize)]
pub struct SelectTemplateResponse {
    pub template_name: String,
    /// Slot name -> filename/URL or extracted text; `null` when unfilled
    pub slots: BTreeMap<String, Option<String>>,
    pub classified_images: Vec<ClassifiedImage>,
    pub extracted_fields: ExtractedFields,
}

/// Form fields collected from the multipart body
#[derive(Debug, Default)]
pub struct SubmissionForm {
    pub text: Option<String>,
    pub images: Vec<ImageInput>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl SubmissionForm {
    pub fn into_submission(self) -> Result<ListingSubmission, ApiError> {
        let missing: Vec<&str> = [
            ("name", &self.name),
            ("email", &self.email),
            ("address", &self.address),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
        .map(|(key, _)| key)
        .collect();
        if !missing.is_empty() {
            return Err(ApiError::BadRequest(format!(
                "Missing form fields: {}",
                missing.join(", ")
            )));
        }

        let text = self.text.ok_or_else(|| {
            ApiError::BadRequest("Either 'text_file' or 'text_data' is required".to_string())
        })?;

        Ok(ListingSubmission {
            text,
            images: self.images,
            realtor: RealtorContact {
                name: self.name.unwrap_or_default().trim().to_string(),
                email: self.email.unwrap_or_default().trim().to_string(),
                address: self.address.unwrap_or_default().trim().to_string(),
            },
        })
    }
}

/// Content type for an uploaded image, falling back to the file extension
/// when the client sent none or a generic one.
pub fn resolve_image_content_type(declared: Option<&str>, filename: &str) -> Option<&'static str> {
    if let Some(declared) = declared {
        let declared = declared.to_ascii_lowercase();
        if let Some(allowed) = ALLOWED_CONTENT_TYPES.iter().find(|t| **t == declared) {
            return Some(*allowed);
        }
        if declared != "application/octet-stream" {
            return None;
        }
    }

    let extension = filename.rsplit_once('.')?.1.to_ascii_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// `POST /select-template/`
pub async fn select_template_handler(
    Extension(state): Extension<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SelectTemplateResponse>, ApiError> {
    let mut form = SubmissionForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read multipart data: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "text_file" => {
                let bytes = field.bytes().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read text file: {}", e))
                })?;
                let text = String::from_utf8(bytes.to_vec()).map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read text file: {}", e))
                })?;
                form.text = Some(text);
            }
            "text_data" => form.text = Some(read_text(field).await?),
            "images" | "images[]" => {
                if let Some(image) = read_image(field, form.images.len()).await? {
                    form.images.push(image);
                }
            }
            "image_urls" | "image_urls[]" => {
                let url = read_text(field).await?.trim().to_string();
                if url.is_empty() {
                    continue;
                }
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(ApiError::BadRequest(format!("Invalid image URL '{}'", url)));
                }
                form.images.push(ImageInput::url(url));
            }
            "name" => form.name = Some(read_text(field).await?),
            "email" => form.email = Some(read_text(field).await?),
            "address" => form.address = Some(read_text(field).await?),
            other => tracing::debug!(field = %other, "Ignoring unknown form field"),
        }
    }

    let submission = form.into_submission()?;
    tracing::info!(
        images = submission.images.len(),
        text_length = submission.text.len(),
        "Listing submitted"
    );

    let composed = compose_listing(&submission, &state.deps).await?;

    Ok(Json(SelectTemplateResponse {
        template_name: composed.result.template_name,
        slots: composed.result.slots,
        classified_images: composed.classified_images,
        extracted_fields: composed.extracted,
    }))
}

async fn read_text(field: Field<'_>) -> Result<String, ApiError> {
    let name = field.name().unwrap_or_default().to_string();
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read field '{}': {}", name, e)))
}

/// Read one image part. Empty parts (a file input left blank) are skipped.
async fn read_image(field: Field<'_>, index: usize) -> Result<Option<ImageInput>, ApiError> {
    let filename = field
        .file_name()
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("image-{}", index + 1));
    let declared = field.content_type().map(str::to_string);

    let bytes = field
        .bytes()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read image '{}': {}", filename, e)))?;
    if bytes.is_empty() {
        return Ok(None);
    }

    let content_type = resolve_image_content_type(declared.as_deref(), &filename).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "Unsupported image type for '{}'. Allowed: {}",
            filename,
            ALLOWED_CONTENT_TYPES.join(", ")
        ))
    })?;

    Ok(Some(ImageInput::upload(filename, content_type, bytes.to_vec())))
}
