//! Shared test helpers for API integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use jobhub_api::router::build_router;
use jobhub_api::state::AppState;
use jobhub_core::config::{AppConfig, WorkerConfig};
use jobhub_database::{JobStore, MemoryJobStore};
use jobhub_worker::Dispatcher;
use jobhub_worker::jobs::SimulatedJobHandler;

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Store behind the router, for direct inspection
    pub store: Arc<dyn JobStore>,
    /// Worker pool, when enabled
    pub dispatcher: Option<Arc<Dispatcher>>,
}

impl TestApp {
    /// Application with a running worker pool whose jobs take `work`.
    pub async fn new(work: Duration) -> Self {
        let config = test_config();
        let store: Arc<dyn JobStore> = Arc::new(MemoryJobStore::new());

        let dispatcher = Arc::new(
            Dispatcher::new(
                Arc::clone(&store),
                Arc::new(SimulatedJobHandler::new(work)),
                &config.worker,
            )
            .expect("Failed to create dispatcher"),
        );
        dispatcher.start().expect("Failed to start dispatcher");

        Self::assemble(config, store, Some(dispatcher))
    }

    /// Application without workers; submitted jobs stay `queued`.
    pub fn without_workers() -> Self {
        let store: Arc<dyn JobStore> = Arc::new(MemoryJobStore::new());
        Self::assemble(test_config(), store, None)
    }

    fn assemble(
        config: AppConfig,
        store: Arc<dyn JobStore>,
        dispatcher: Option<Arc<Dispatcher>>,
    ) -> Self {
        let state = AppState::new(config, Arc::clone(&store), dispatcher.clone());
        Self {
            router: build_router(state),
            store,
            dispatcher,
        }
    }

    /// Make an HTTP request with an optional raw body
    pub async fn request(&self, method: &str, path: &str, body: Option<&str>) -> TestResponse {
        let req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.unwrap_or_default().to_string()))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let text = String::from_utf8_lossy(&body_bytes).to_string();
        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body, text }
    }

    /// POST a JSON value to `/jobs`
    pub async fn submit(&self, payload: Value) -> TestResponse {
        let body = serde_json::to_string(&payload).expect("Failed to serialize body");
        self.request("POST", "/jobs", Some(&body)).await
    }

    /// Poll `GET /jobs/{id}` until the job reaches `status`.
    pub async fn wait_for_status(&self, id: i64, status: &str) -> TestResponse {
        let path = format!("/jobs/{id}");
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let response = self.request("GET", &path, None).await;
                if response.body["status"] == status {
                    return response;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .expect("job never reached the expected status")
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body (`Null` when the body is not JSON)
    pub body: Value,
    /// Raw body text
    pub text: String,
}

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.store.backend = "memory".to_string();
    config.worker = WorkerConfig {
        concurrency: 2,
        queue_capacity: 16,
        ..WorkerConfig::default()
    };
    config
}
