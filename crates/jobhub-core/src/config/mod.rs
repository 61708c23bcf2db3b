//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section, and every field carries a serde default so a missing file
//! still yields a runnable configuration.

pub mod app;
pub mod database;
pub mod logging;
pub mod worker;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use self::app::ServerConfig;
pub use self::database::{DatabaseConfig, StoreConfig};
pub use self::logging::LoggingConfig;
pub use self::worker::WorkerConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// Top-level deserialization target for the merged configuration
/// (default.toml + environment overlay + environment variables).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Job store backend selection.
    #[serde(default)]
    pub store: StoreConfig,
    /// Worker pool settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from `config/default.toml` and `config/{env}.toml`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        Self::load_from("config/default.toml", env)
    }

    /// Load configuration from the given base file.
    ///
    /// Merges, in increasing precedence: the base file, a sibling
    /// `{env}.toml` overlay, `JOBHUB__SECTION__KEY` environment variables,
    /// and the plain `DATABASE_URL` / `PORT` variables. Missing files are
    /// skipped.
    pub fn load_from(base: &str, env: &str) -> Result<Self, AppError> {
        let base_path = Path::new(base);
        let overlay = base_path.with_file_name(format!("{env}.toml"));

        let config = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(overlay.as_path()).required(false))
            .add_source(
                config::Environment::with_prefix("JOBHUB")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("server.port", std::env::var("PORT").ok())?
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject configurations the worker pool or store cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.worker.concurrency == 0 {
            return Err(AppError::configuration(
                "worker.concurrency must be at least 1",
            ));
        }
        if self.worker.queue_capacity == 0 {
            return Err(AppError::configuration(
                "worker.queue_capacity must be at least 1",
            ));
        }
        match self.store.backend.as_str() {
            "postgres" if self.database.url.is_empty() => Err(AppError::configuration(
                "database.url (or DATABASE_URL) is required for the postgres store",
            )),
            "postgres" | "memory" => Ok(()),
            other => Err(AppError::configuration(format!(
                "Unknown store backend: '{other}'. Supported: postgres, memory"
            ))),
        }
    }
}
