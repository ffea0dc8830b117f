use anyhow::Context;
use tracing_subscriber::EnvFilter;

use giftcert_api::config::config;
use giftcert_api::database::DatabaseManager;
use giftcert_api::services::SeedService;
use giftcert_api::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SECURITY_JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")))
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config();
    tracing::info!("Starting Gift Certificate API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("SECURITY_JWT_SECRET must be set");
    }

    let pool = DatabaseManager::connect_lazy(&config.database).context("database configuration")?;

    if config.database.run_migrations {
        // Keep serving with a degraded /health when the database is not reachable yet
        if let Err(e) = DatabaseManager::migrate(&pool).await {
            tracing::error!("Migrations failed: {}", e);
        }
    }

    if config.seed.initial_records > 0 {
        match SeedService::new(pool.clone()).generate(config.seed.initial_records).await {
            Ok(summary) => tracing::info!("Seeded initial data: {:?}", summary),
            Err(e) => tracing::error!("Initial data generation failed: {}", e),
        }
    }

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Gift Certificate API listening on http://{}", bind_addr);

    axum::serve(listener, app(AppState::new(pool))).await?;
    Ok(())
}
