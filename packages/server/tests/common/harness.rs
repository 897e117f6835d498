//! Test harness with testcontainers for integration testing.
//!
//! One Postgres container is shared by every test. Each harness gets its own
//! freshly migrated database inside it, so tests never see each other's
//! templates.

use anyhow::{Context, Result};
use axum::Router;
use listing_core::kernel::{MockAI, MockImageClassifier, ServerDeps};
use listing_core::server::build_app;
use sqlx::PgPool;
use std::sync::Arc;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

/// Shared test infrastructure that persists across all tests.
struct SharedTestInfra {
    host: String,
    port: u16,
    // Keep the container alive for the entire test run
    _postgres: ContainerAsync<Postgres>,
}

static SHARED_INFRA: OnceCell<SharedTestInfra> = OnceCell::const_new();

impl SharedTestInfra {
    async fn init() -> Result<Self> {
        // Run tests with: RUST_LOG=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let postgres = Postgres::default()
            .with_tag("16")
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let host = postgres.get_host().await?.to_string();
        let port = postgres.get_host_port_ipv4(5432).await?;

        Ok(Self {
            host,
            port,
            _postgres: postgres,
        })
    }

    async fn get() -> &'static Self {
        SHARED_INFRA
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared test infrastructure")
            })
            .await
    }

    fn url(&self, database: &str) -> String {
        format!(
            "postgresql://postgres:postgres@{}:{}/{}",
            self.host, self.port, database
        )
    }

    /// Create an empty database and run migrations on it
    async fn fresh_database(&self) -> Result<PgPool> {
        let name = format!("test_{}", Uuid::new_v4().simple());

        let admin = PgPool::connect(&self.url("postgres"))
            .await
            .context("Failed to connect to Postgres")?;
        sqlx::query(&format!("CREATE DATABASE {}", name))
            .execute(&admin)
            .await
            .with_context(|| format!("Failed to create database {}", name))?;
        admin.close().await;

        let pool = PgPool::connect(&self.url(&name))
            .await
            .context("Failed to connect to test database")?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;

        Ok(pool)
    }
}

/// Test harness that manages test infrastructure.
///
/// # Example using test-context
///
/// ```ignore
/// use test_context::test_context;
///
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// async fn my_test(ctx: &TestHarness) {
///     let app = ctx.app();
///     // ... test code
/// }
/// ```
pub struct TestHarness {
    /// Database pool - use this for test fixtures.
    pub db_pool: PgPool,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create test harness")
    }

    async fn teardown(self) {
        self.db_pool.close().await;
    }
}

impl TestHarness {
    pub async fn new() -> Result<Self> {
        let infra = SharedTestInfra::get().await;
        let db_pool = infra.fresh_database().await?;
        Ok(Self { db_pool })
    }

    /// Router wired to default mocks (empty extraction, first label wins)
    pub fn app(&self) -> Router {
        self.app_with(MockAI::new(), MockImageClassifier::new())
    }

    /// Router wired to the given mocks
    pub fn app_with(&self, ai: MockAI, classifier: MockImageClassifier) -> Router {
        self.app_with_shared(Arc::new(ai), Arc::new(classifier))
    }

    /// Router wired to mocks the test keeps a handle on for call assertions
    pub fn app_with_shared(&self, ai: Arc<MockAI>, classifier: Arc<MockImageClassifier>) -> Router {
        build_app(ServerDeps::new(self.db_pool.clone(), ai, classifier))
    }
}
