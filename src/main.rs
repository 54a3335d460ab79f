//! Drinkery server binary

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use drinkery::api::{create_router, AppState};
use drinkery::auth::TokenVerifier;
use drinkery::config::{AppConfig, LogFormat};
use drinkery::storage::{DrinkStore, SqliteDrinkStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;

    init_tracing(&config)?;

    let verifier_config = config
        .verifier_config()
        .context("invalid auth configuration")?;
    let verifier = TokenVerifier::new(verifier_config).context("failed to build token verifier")?;

    let store = build_store(&config).await?;

    let state = AppState::new(store, Arc::new(verifier));
    let router = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    tracing::info!(%addr, "Listening for HTTP traffic");

    axum::serve(listener, router).await?;

    Ok(())
}

async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn DrinkStore>> {
    let database = &config.database;
    let store = SqliteDrinkStore::connect(&database.url, database.max_connections)
        .await
        .with_context(|| format!("failed to open database {}", database.url))?;

    if database.reset_on_start {
        tracing::warn!(url = %database.url, "Resetting drink table");
        store
            .drop_and_create_all()
            .await
            .context("failed to reset database")?;
    } else {
        store.setup().await.context("failed to set up database")?;
    }

    Ok(Arc::new(store))
}

fn init_tracing(config: &AppConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.logging.level.clone()))
        .unwrap_or_else(|_| EnvFilter::new("drinkery=info,tower_http=info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format {
        LogFormat::Json => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        LogFormat::Text => {
            registry.with(tracing_subscriber::fmt::layer()).init();
        }
    }

    Ok(())
}
