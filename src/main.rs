use anyhow::{Context, Result};
use diesel_migrations::{EmbeddedMigrations, embed_migrations};
use food_orderservice::{app_state::AppState, bootstrap, config::AppConfig, db, routes};

/// Migrations embedded into the binary which helps with streamlining image building process
const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_env();
    bootstrap::init_tracing();

    let config = AppConfig::load().context("Failed to load configuration")?;

    tracing::info!("Running migrations...");
    let migrations_count = db::run_migrations_blocking(MIGRATIONS, &config.database.url).await?;
    tracing::info!("Run {} new migrations successfully", migrations_count);

    tracing::info!("Bootstrapping...");
    let db_pool = db::create_pool(&config.database).await?;
    let state = AppState::from_config(&config, db_pool, reqwest::Client::new());
    let placement = state.placement.clone();
    let app = routes::app(state);

    let served = bootstrap::serve("OrderService", app, config.server.socket_addr()?).await;
    placement.drain().await;
    served
}
