//! Background worker pool configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Worker pool (dispatcher) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the worker pool is started with the server.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Number of concurrent workers draining the queue.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Capacity of the in-memory work queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Upper bound on a single handler invocation in seconds (0 = unbounded).
    #[serde(default)]
    pub handler_timeout_seconds: u64,
    /// How long shutdown waits for workers to drain, in seconds.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_seconds: u64,
    /// Re-enqueue unfinished jobs found in the store at startup.
    #[serde(default = "default_true")]
    pub recover_on_startup: bool,
    /// Duration of the built-in simulated job, in milliseconds.
    #[serde(default = "default_simulated_work")]
    pub simulated_work_millis: u64,
}

impl WorkerConfig {
    /// Handler timeout, if one is configured.
    pub fn handler_timeout(&self) -> Option<Duration> {
        (self.handler_timeout_seconds > 0).then(|| Duration::from_secs(self.handler_timeout_seconds))
    }

    /// Shutdown grace period.
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_seconds)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            concurrency: default_concurrency(),
            queue_capacity: default_queue_capacity(),
            handler_timeout_seconds: 0,
            shutdown_grace_seconds: default_shutdown_grace(),
            recover_on_startup: true,
            simulated_work_millis: default_simulated_work(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    5
}

fn default_queue_capacity() -> usize {
    100
}

fn default_shutdown_grace() -> u64 {
    30
}

fn default_simulated_work() -> u64 {
    2000
}
