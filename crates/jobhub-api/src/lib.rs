//! # jobhub-api
//!
//! HTTP API layer for JobHub built on Axum.
//!
//! Provides the job submission and query endpoints, the health probe,
//! request logging, error mapping, and the server entry point that wires
//! the job store and dispatcher together.

pub mod app;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use state::AppState;
