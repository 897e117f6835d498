//! HTTP error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domains::listings::ComposeError;
use crate::domains::templates::{MatchError, RegisterError};

/// JSON body of every error response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub problems: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            missing: Vec::new(),
            problems: Vec::new(),
            detail: None,
        }
    }

    fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request (unreadable multipart, missing form fields)
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Template upload rejected by validation
    #[error("validation failed")]
    Validation {
        missing: Vec<String>,
        problems: Vec<String>,
    },

    #[error("templates already exist: {}", .0.join(", "))]
    Conflict(Vec<String>),

    #[error("no matching template")]
    NoMatchingTemplate,

    /// The language model or the vision model failed
    #[error("extraction failed ({stage}): {detail}")]
    ExternalService { stage: &'static str, detail: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NoMatchingTemplate => StatusCode::NOT_FOUND,
            ApiError::ExternalService { .. } => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            ApiError::BadRequest(message) => ErrorResponse::new(message.clone()),
            ApiError::Validation { missing, problems } => ErrorResponse {
                missing: missing.clone(),
                problems: problems.clone(),
                ..ErrorResponse::new("validation failed")
            },
            ApiError::Conflict(names) => ErrorResponse::new("template already exists")
                .with_detail(names.join(", ")),
            ApiError::NoMatchingTemplate => ErrorResponse::new("no matching template"),
            ApiError::ExternalService { stage, detail } => {
                ErrorResponse::new("extraction failed").with_detail(format!("{}: {}", stage, detail))
            }
            ApiError::Internal(_) => ErrorResponse::new("internal error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Internal(e) => tracing::error!(error = ?e, "Request failed"),
            ApiError::ExternalService { .. } => tracing::warn!(error = %self, "Upstream model failed"),
            _ => tracing::debug!(error = %self, status = %status, "Request rejected"),
        }
        (status, Json(self.body())).into_response()
    }
}

impl From<RegisterError> for ApiError {
    fn from(error: RegisterError) -> Self {
        match error {
            RegisterError::Invalid(v) => ApiError::Validation {
                missing: v.missing,
                problems: v.problems,
            },
            RegisterError::AlreadyExists(names) => ApiError::Conflict(names),
            RegisterError::Storage(e) => ApiError::Internal(e),
        }
    }
}

impl From<ComposeError> for ApiError {
    fn from(error: ComposeError) -> Self {
        match error {
            ComposeError::Extraction(e) => ApiError::ExternalService {
                stage: "text extraction",
                detail: format!("{:#}", e),
            },
            ComposeError::Classification(e) => ApiError::ExternalService {
                stage: "image classification",
                detail: format!("{:#}", e),
            },
            ComposeError::NoMatch(MatchError::NoMatchingTemplate) => ApiError::NoMatchingTemplate,
            ComposeError::Storage(e) => ApiError::Internal(e),
        }
    }
}
