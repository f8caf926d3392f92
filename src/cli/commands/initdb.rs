use anyhow::{Context, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use tracing::{info, trace};

pub async fn init_database(database_url: &str) -> Result<()> {
    trace!("Entering init_database function");
    info!("Initializing database at {}", database_url);

    let db = Database::connect(database_url)
        .await
        .with_context(|| format!("failed to connect to {database_url}"))?;

    info!("Running database migrations");
    Migrator::up(&db, None)
        .await
        .context("failed to apply migrations")?;

    info!("Database schema is up to date");
    Ok(())
}
