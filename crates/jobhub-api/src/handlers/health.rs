//! Health check handler.

/// GET /health
///
/// Liveness only; touches neither the store nor the worker pool.
pub async fn health() -> &'static str {
    "OK"
}
