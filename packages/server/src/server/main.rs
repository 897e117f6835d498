// Main entry point for API server

use std::sync::Arc;

use anyhow::{Context, Result};
use listing_core::kernel::{OpenAIChat, OpenAIVisionClassifier, ServerDeps};
use listing_core::{server::build_app, Config};
use openai_client::OpenAIClient;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,listing_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Listing Template API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        extraction_model = %config.extraction_model,
        vision_model = %config.vision_model,
        "Configuration loaded"
    );

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    // External model clients share one HTTP client
    let mut openai = OpenAIClient::new(config.openai_api_key.clone());
    if let Some(base_url) = &config.openai_base_url {
        openai = openai.with_base_url(base_url);
    }

    let deps = ServerDeps::new(
        pool,
        Arc::new(OpenAIChat::new(openai.clone(), &config.extraction_model)),
        Arc::new(OpenAIVisionClassifier::new(openai, &config.vision_model)),
    )
    .with_max_field_length(config.max_field_length);

    // Build application
    let app = build_app(deps);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
