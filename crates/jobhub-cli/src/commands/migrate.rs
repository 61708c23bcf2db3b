//! Database migration command.

use jobhub_core::config::AppConfig;
use jobhub_core::error::AppError;
use jobhub_database::connect_pool;
use jobhub_database::migration::run_migrations;

use crate::output;

/// Apply all pending migrations to the configured database
pub async fn execute(config: &AppConfig) -> Result<(), AppError> {
    if config.store.backend != "postgres" {
        return Err(AppError::configuration(format!(
            "Migrations apply to the postgres backend only (configured: '{}')",
            config.store.backend
        )));
    }

    let pool = connect_pool(&config.database).await?;

    println!("Running database migrations...");
    run_migrations(&pool).await?;
    pool.close().await;

    output::print_success("All migrations applied successfully.");
    Ok(())
}
