//! Server dependencies for request handlers (using traits for testability)
//!
//! All external services sit behind trait objects so tests can swap in mocks.

use sqlx::PgPool;
use std::sync::Arc;

use crate::kernel::{BaseAI, BaseImageClassifier};

/// Default cap on extracted text values, in characters
pub const DEFAULT_MAX_FIELD_LENGTH: usize = 100;

/// Server dependencies accessible to activities
#[derive(Clone)]
pub struct ServerDeps {
    pub db_pool: PgPool,
    /// LLM used for text field extraction
    pub ai: Arc<dyn BaseAI>,
    /// Pretrained vision model used for photo categories
    pub image_classifier: Arc<dyn BaseImageClassifier>,
    pub max_field_length: usize,
}

impl ServerDeps {
    pub fn new(
        db_pool: PgPool,
        ai: Arc<dyn BaseAI>,
        image_classifier: Arc<dyn BaseImageClassifier>,
    ) -> Self {
        Self {
            db_pool,
            ai,
            image_classifier,
            max_field_length: DEFAULT_MAX_FIELD_LENGTH,
        }
    }

    pub fn with_max_field_length(mut self, max_field_length: usize) -> Self {
        self.max_field_length = max_field_length;
        self
    }
}
