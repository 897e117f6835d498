//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Extension},
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::kernel::ServerDeps;
use crate::server::routes::{
    health_handler, list_templates_handler, select_template_handler, upload_template_handler,
};

/// Listing uploads carry several photos; axum's 2 MB default is too small
const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub deps: Arc<ServerDeps>,
}

impl AppState {
    pub fn new(deps: ServerDeps) -> Self {
        Self {
            db_pool: deps.db_pool.clone(),
            deps: Arc::new(deps),
        }
    }
}

/// Build the Axum application router
pub fn build_app(deps: ServerDeps) -> Router {
    let app_state = AppState::new(deps);

    Router::new()
        .route("/upload-template/", post(upload_template_handler))
        .route("/select-template/", post(select_template_handler))
        .route("/templates/", get(list_templates_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(Extension(app_state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
