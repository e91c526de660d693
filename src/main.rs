//! Lending library - database bootstrap
//!
//! Applies migrations and reports the state of the catalog.

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lending_library::{config::AppConfig, repository::Repository, services::Services};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("lending_library={}", config.logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting lending library v{}", env!("CARGO_PKG_VERSION"));

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await?;

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::info!("Database migrations completed");

    let services = Services::new(Repository::postgres(pool), config.lending.clone());

    let summary = services.catalog.catalog_summary().await?;
    let people = services.people.count().await?;
    let overdue = services.lending.count_overdue().await?;

    tracing::info!(
        "Catalog ready: {} books ({} on loan, {} available), {} people, {} overdue loans",
        summary.books,
        summary.on_loan,
        summary.available,
        people,
        overdue
    );

    Ok(())
}
