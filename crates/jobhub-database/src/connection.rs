//! PostgreSQL pool setup for the job repository.

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tracing::info;

use jobhub_core::config::DatabaseConfig;
use jobhub_core::error::{AppError, ErrorKind};
use jobhub_core::result::AppResult;

/// Name reported to PostgreSQL in `pg_stat_activity`.
const APPLICATION_NAME: &str = "jobhub";

/// Connect a pool sized for the API handlers plus the worker pool.
///
/// The URL is parsed before any connection is attempted, so a malformed
/// `database.url` surfaces as a configuration error rather than a database
/// one.
pub async fn connect_pool(config: &DatabaseConfig) -> AppResult<PgPool> {
    if config.min_connections > config.max_connections {
        return Err(AppError::configuration(format!(
            "database.min_connections ({}) exceeds database.max_connections ({})",
            config.min_connections, config.max_connections
        )));
    }

    let options = PgConnectOptions::from_str(&config.url)
        .map_err(|e| AppError::configuration(format!("Invalid database.url: {e}")))?
        .application_name(APPLICATION_NAME);

    info!(
        url = %redact_url(&config.url),
        max_connections = config.max_connections,
        "Connecting job store to PostgreSQL"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
        .connect_with(options)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Job store database unreachable", e)
        })?;

    Ok(pool)
}

/// Replace the password in a connection URL with `****` for logging.
fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let Some((credentials, host)) = rest.rsplit_once('@') else {
        return url.to_string();
    };
    match credentials.split_once(':') {
        Some((user, _)) => format!("{scheme}://{user}:****@{host}"),
        None => url.to_string(),
    }
}
