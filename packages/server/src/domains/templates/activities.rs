//! Template registration.

use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;

use super::data::{parse_template_specs, ValidationError};
use super::models::Template;

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("invalid template payload: {0}")]
    Invalid(ValidationError),

    #[error("templates already exist: {}", .0.join(", "))]
    AlreadyExists(Vec<String>),

    #[error("failed to store templates: {0:#}")]
    Storage(anyhow::Error),
}

/// Validate and store every template in `payload`, all or nothing.
///
/// Templates are immutable, so uploading a name that is already stored is
/// rejected rather than treated as an update.
pub async fn register_templates(
    payload: Value,
    pool: &PgPool,
) -> Result<Vec<Template>, RegisterError> {
    let specs = parse_template_specs(payload).map_err(RegisterError::Invalid)?;

    let names: Vec<String> = specs.iter().map(|s| s.template_name.clone()).collect();
    let taken = Template::existing_names(&names, pool)
        .await
        .map_err(RegisterError::Storage)?;
    if !taken.is_empty() {
        return Err(RegisterError::AlreadyExists(taken));
    }

    let created = Template::create_many(&specs, pool).await.map_err(|e| {
        // Lost a race with a concurrent upload of the same name
        if is_unique_violation(&e) {
            RegisterError::AlreadyExists(names.clone())
        } else {
            RegisterError::Storage(e)
        }
    })?;

    tracing::info!(
        count = created.len(),
        templates = ?names,
        "Registered templates"
    );

    Ok(created)
}

fn is_unique_violation(error: &anyhow::Error) -> bool {
    error
        .chain()
        .filter_map(|cause| cause.downcast_ref::<sqlx::Error>())
        .any(|e| matches!(e, sqlx::Error::Database(db) if db.is_unique_violation()))
}
