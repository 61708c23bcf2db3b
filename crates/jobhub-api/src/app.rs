//! Application builder: wires router and state into an Axum app and runs it.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;

use jobhub_core::config::AppConfig;
use jobhub_core::error::AppError;
use jobhub_database::open_store;
use jobhub_worker::Dispatcher;
use jobhub_worker::jobs::SimulatedJobHandler;

use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    build_router(state)
}

/// Runs the JobHub server until a shutdown signal arrives.
///
/// On shutdown the listener stops first, in-flight requests finish, then
/// the worker pool drains its queue within the configured grace period.
pub async fn run_server(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting JobHub server...");

    // ── Step 1: Job store ────────────────────────────────────────
    tracing::info!("Opening job store (backend: {})...", config.store.backend);
    let store = open_store(&config.store, &config.database, true).await?;

    // ── Step 2: Worker pool ──────────────────────────────────────
    let dispatcher = if config.worker.enabled {
        let handler = Arc::new(SimulatedJobHandler::new(Duration::from_millis(
            config.worker.simulated_work_millis,
        )));
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&store),
            handler,
            &config.worker,
        )?);
        dispatcher.start()?;
        tracing::info!("Worker pool '{}' accepting jobs", dispatcher.id());

        if config.worker.recover_on_startup {
            let recovering = Arc::clone(&dispatcher);
            tokio::spawn(async move {
                match recovering.recover().await {
                    Ok(0) => tracing::debug!("No unfinished jobs to recover"),
                    Ok(count) => tracing::info!("Re-enqueued {} unfinished job(s)", count),
                    Err(e) => tracing::error!("Job recovery failed: {}", e),
                }
            });
        }
        Some(dispatcher)
    } else {
        tracing::info!("Worker pool disabled; submitted jobs stay queued");
        None
    };

    // ── Step 3: Build and start HTTP server ──────────────────────
    let state = AppState::new(config.clone(), store, dispatcher.clone());
    let app = build_app(state);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("JobHub server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    // ── Step 4: Drain the worker pool ────────────────────────────
    if let Some(dispatcher) = dispatcher {
        if !dispatcher.shutdown(config.worker.shutdown_grace()).await {
            tracing::warn!("Unfinished jobs will be recovered on next start");
        }
    }

    tracing::info!("JobHub server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
