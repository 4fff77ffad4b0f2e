//! Service bootstrap: connects the database, ensures the schema, and seeds
//! plans and discount rules from config.toml.

use dotenvy::dotenv;
use mealsub::{
    config::{database, pricing},
    errors::Result,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; non-fatal, env vars can be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Initialize database
    let db = database::create_connection()
        .await
        .inspect(|_| info!("Database connection established."))
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 4. Seed pricing configuration
    let config = pricing::load_default_config()
        .inspect_err(|e| error!("Failed to load pricing configuration: {}", e))?;
    let summary = pricing::seed_pricing(&db, &config)
        .await
        .inspect_err(|e| error!("Failed to seed pricing: {}", e))?;

    info!(
        plans = config.plans.len(),
        prices_inserted = summary.prices_inserted,
        rules_inserted = summary.rules_inserted,
        "Startup complete."
    );

    Ok(())
}
