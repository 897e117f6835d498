use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;
use std::time::Duration;

use crate::domains::templates::Template;
use crate::server::app::AppState;

const DATABASE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Stored templates; absent when the database did not answer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `GET /health` - 200 when the template store answers, 503 otherwise
pub async fn health_handler(
    Extension(state): Extension<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let outcome = match tokio::time::timeout(DATABASE_TIMEOUT, Template::count(&state.db_pool)).await {
        Ok(Ok(count)) => Ok(count),
        Ok(Err(e)) => Err(format!("{:#}", e)),
        Err(_) => Err(format!("database did not answer within {:?}", DATABASE_TIMEOUT)),
    };

    match outcome {
        Ok(count) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                templates: Some(count),
                error: None,
            }),
        ),
        Err(error) => {
            tracing::warn!(error = %error, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy",
                    templates: None,
                    error: Some(error),
                }),
            )
        }
    }
}
