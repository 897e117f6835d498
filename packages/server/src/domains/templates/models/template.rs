use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::domains::templates::data::{TemplateSpec, TextFieldSpec};

/// Stored document template. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Template {
    pub id: Uuid,
    /// Declaration order; lower was stored first
    pub position: i64,
    pub name: String,
    pub realtor_name: String,
    pub realtor_address: String,
    pub realtor_email: String,
    pub realtor_photo: Option<String>,
    pub logos: Vec<String>,
    pub property_images: Vec<String>,
    /// Text slot names, in declaration order
    pub text_fields: Vec<String>,
    /// Length limits and format hints for the text slots that declare them
    pub text_field_details: Json<Vec<TextFieldSpec>>,
    /// property images + logos + realtor photo slot
    pub img_count: i32,
    /// text fields + the three realtor text slots
    pub text_count: i32,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Template Queries
// =============================================================================

impl Template {
    /// Insert a batch of templates in one transaction, in the given order.
    pub async fn create_many(specs: &[TemplateSpec], pool: &PgPool) -> Result<Vec<Self>> {
        let mut tx = pool.begin().await.context("Failed to start transaction")?;

        let mut created = Vec::with_capacity(specs.len());
        for spec in specs {
            created.push(Self::insert(spec, &mut tx).await?);
        }

        tx.commit().await.context("Failed to commit templates")?;
        Ok(created)
    }

    /// Insert a single template
    pub async fn create(spec: &TemplateSpec, pool: &PgPool) -> Result<Self> {
        let mut conn = pool.acquire().await?;
        Self::insert(spec, &mut conn).await
    }

    async fn insert(spec: &TemplateSpec, conn: &mut PgConnection) -> Result<Self> {
        sqlx::query_as::<_, Template>(
            r#"
            INSERT INTO templates (
                id, name, realtor_name, realtor_address, realtor_email, realtor_photo,
                logos, property_images, text_fields, text_field_details,
                img_count, text_count
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&spec.template_name)
        .bind(&spec.realtor.name)
        .bind(&spec.realtor.address)
        .bind(&spec.realtor.email)
        .bind(&spec.realtor.photo)
        .bind(&spec.logos)
        .bind(&spec.property_images)
        .bind(spec.text_field_names())
        .bind(Json(
            spec.text_fields
                .iter()
                .filter(|f| f.approx_length.is_some() || f.format.is_some())
                .collect::<Vec<_>>(),
        ))
        .bind(spec.img_count() as i32)
        .bind(spec.text_count() as i32)
        .fetch_one(conn)
        .await
        .with_context(|| format!("Failed to insert template '{}'", spec.template_name))
    }

    /// All templates in declaration order
    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Template>("SELECT * FROM templates ORDER BY position")
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }

    /// Find template by its name (the template's identity)
    pub async fn find_by_name(name: &str, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Template>("SELECT * FROM templates WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Which of `names` are already taken
    pub async fn existing_names(names: &[String], pool: &PgPool) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT name FROM templates WHERE name = ANY($1) ORDER BY position",
        )
        .bind(names)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Number of stored templates
    pub async fn count(pool: &PgPool) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM templates")
            .fetch_one(pool)
            .await
            .map_err(Into::into)
    }

    /// Total slot count the matcher compares against available content
    pub fn slot_total(&self) -> usize {
        self.logos.len() + self.property_images.len() + self.text_fields.len()
    }

    /// Text slots in declaration order, with their details where declared
    pub fn text_field_specs(&self) -> Vec<TextFieldSpec> {
        self.text_fields
            .iter()
            .map(|name| {
                self.text_field_details
                    .iter()
                    .find(|detail| &detail.name == name)
                    .cloned()
                    .unwrap_or_else(|| TextFieldSpec::named(name.clone()))
            })
            .collect()
    }
}
