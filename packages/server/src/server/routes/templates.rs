//! Template registration and listing.

use axum::{
    body::Bytes,
    extract::{Extension, FromRequest, Multipart, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domains::templates::{register_templates, Template, TemplateSummary};
use crate::server::app::AppState;
use crate::server::error::ApiError;

/// Multipart field carrying the template JSON file
const METADATA_FIELD: &str = "metadata";

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadTemplatesResponse {
    pub stored: usize,
    pub templates: Vec<String>,
}

/// `POST /upload-template/`
///
/// Accepts the template JSON (one object or an array) either as the request
/// body or as a `metadata` file in a multipart form.
pub async fn upload_template_handler(
    Extension(state): Extension<AppState>,
    request: Request,
) -> Result<(StatusCode, Json<UploadTemplatesResponse>), ApiError> {
    let body = read_template_payload(request).await?;

    let payload: serde_json::Value = serde_json::from_slice(&body).map_err(|e| ApiError::Validation {
        missing: Vec::new(),
        problems: vec![format!("invalid JSON: {}", e)],
    })?;

    let created = register_templates(payload, &state.db_pool).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadTemplatesResponse {
            stored: created.len(),
            templates: created.into_iter().map(|t| t.name).collect(),
        }),
    ))
}

async fn read_template_payload(request: Request) -> Result<Bytes, ApiError> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));

    if !is_multipart {
        return Bytes::from_request(request, &())
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read request body: {}", e)));
    }

    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart form: {}", e)))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read multipart data: {}", e)))?
    {
        if field.name() == Some(METADATA_FIELD) {
            return field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read metadata file: {}", e)));
        }
    }

    Err(ApiError::BadRequest(format!(
        "Multipart upload must include a '{}' file",
        METADATA_FIELD
    )))
}

/// `GET /templates/` - every stored template in declaration order
pub async fn list_templates_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<TemplateSummary>>, ApiError> {
    let templates = Template::find_all(&state.db_pool).await?;
    Ok(Json(templates.iter().map(TemplateSummary::from).collect()))
}
