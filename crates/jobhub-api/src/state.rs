//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use jobhub_core::config::AppConfig;
use jobhub_database::JobStore;
use jobhub_worker::Dispatcher;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Job store backing every endpoint
    pub store: Arc<dyn JobStore>,
    /// Worker pool; `None` when workers are disabled on this instance
    pub dispatcher: Option<Arc<Dispatcher>>,
}

impl AppState {
    /// Bundle the shared dependencies.
    pub fn new(
        config: AppConfig,
        store: Arc<dyn JobStore>,
        dispatcher: Option<Arc<Dispatcher>>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            dispatcher,
        }
    }
}
