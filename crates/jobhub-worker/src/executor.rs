//! Job executor: runs the configured handler against a claimed job.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use jobhub_core::error::AppError;
use jobhub_entity::job::{Job, JobStatus};

/// Trait for job handler implementations
#[async_trait]
pub trait JobHandler: Send + Sync + std::fmt::Debug {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Execute the job and produce its result value
    async fn execute(&self, job: &Job) -> Result<Value, JobExecutionError>;
}

/// Error from job execution
#[derive(Debug, thiserror::Error)]
pub enum JobExecutionError {
    /// The payload cannot be processed by this handler
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// The work itself failed
    #[error("Job failed: {0}")]
    Failed(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

/// Terminal status and result produced by one handler invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    /// `completed` or `failed`
    pub status: JobStatus,
    /// Value persisted as the job result
    pub result: Value,
}

impl JobOutcome {
    /// Successful outcome carrying the handler's value.
    pub fn completed(result: Value) -> Self {
        Self {
            status: JobStatus::Completed,
            result,
        }
    }

    /// Failed outcome; the reason is stored under `error`.
    pub fn failed(reason: impl std::fmt::Display) -> Self {
        Self {
            status: JobStatus::Failed,
            result: serde_json::json!({ "error": reason.to_string() }),
        }
    }
}

/// Invokes the handler with an optional time bound and isolates panics.
///
/// Every invocation yields a [`JobOutcome`]; handler errors, timeouts and
/// panics all become `failed`.
#[derive(Debug, Clone)]
pub struct JobExecutor {
    /// The handler every job is routed to
    handler: Arc<dyn JobHandler>,
    /// Upper bound on a single invocation
    timeout: Option<Duration>,
}

impl JobExecutor {
    /// Create an executor. `None` lets handlers run unbounded.
    pub fn new(handler: Arc<dyn JobHandler>, timeout: Option<Duration>) -> Self {
        Self { handler, timeout }
    }

    /// Name of the wrapped handler
    pub fn handler_name(&self) -> &str {
        self.handler.name()
    }

    /// Run the handler for `job` and classify what happened.
    pub async fn execute(&self, job: &Job) -> JobOutcome {
        tracing::info!(
            "Executing job: id={}, handler='{}'",
            job.id,
            self.handler.name()
        );

        let handler = Arc::clone(&self.handler);
        let snapshot = job.clone();
        let mut task = tokio::spawn(async move { handler.execute(&snapshot).await });

        let joined = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut task).await {
                Ok(joined) => joined,
                Err(_) => {
                    task.abort();
                    tracing::warn!(
                        job_id = job.id,
                        timeout_ms = limit.as_millis() as u64,
                        "Handler timed out"
                    );
                    return JobOutcome::failed(format!(
                        "Handler timed out after {}ms",
                        limit.as_millis()
                    ));
                }
            },
            None => task.await,
        };

        match joined {
            Ok(Ok(value)) => JobOutcome::completed(value),
            Ok(Err(e)) => {
                tracing::warn!(job_id = job.id, error = %e, "Handler returned an error");
                JobOutcome::failed(e)
            }
            Err(e) if e.is_panic() => {
                tracing::error!(job_id = job.id, "Handler panicked");
                JobOutcome::failed("Handler panicked")
            }
            Err(e) => JobOutcome::failed(format!("Handler aborted: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    #[derive(Debug)]
    struct ScriptedHandler;

    #[async_trait]
    impl JobHandler for ScriptedHandler {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn execute(&self, job: &Job) -> Result<Value, JobExecutionError> {
            match job.payload["mode"].as_str() {
                Some("ok") => Ok(json!({ "echo": job.payload["value"] })),
                Some("error") => Err(JobExecutionError::Failed("boom".to_string())),
                Some("panic") => panic!("handler exploded"),
                Some("sleep") => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(json!("late"))
                }
                _ => Err(JobExecutionError::InvalidPayload("missing mode".to_string())),
            }
        }
    }

    fn job(payload: Value) -> Job {
        let now = Utc::now();
        Job {
            id: 7,
            payload,
            status: JobStatus::Processing,
            result: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn executor(timeout: Option<Duration>) -> JobExecutor {
        JobExecutor::new(Arc::new(ScriptedHandler), timeout)
    }

    #[tokio::test]
    async fn test_success_completes() {
        let outcome = executor(None)
            .execute(&job(json!({"mode": "ok", "value": 3})))
            .await;
        assert_eq!(outcome, JobOutcome::completed(json!({"echo": 3})));
    }

    #[tokio::test]
    async fn test_error_fails_with_message() {
        let outcome = executor(None).execute(&job(json!({"mode": "error"}))).await;
        assert_eq!(outcome.status, JobStatus::Failed);
        assert_eq!(outcome.result, json!({"error": "Job failed: boom"}));

        let outcome = executor(None).execute(&job(json!({}))).await;
        assert_eq!(outcome.result, json!({"error": "Invalid payload: missing mode"}));
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let outcome = executor(None).execute(&job(json!({"mode": "panic"}))).await;
        assert_eq!(outcome, JobOutcome::failed("Handler panicked"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fails() {
        let outcome = executor(Some(Duration::from_millis(500)))
            .execute(&job(json!({"mode": "sleep"})))
            .await;
        assert_eq!(outcome.status, JobStatus::Failed);
        assert_eq!(outcome.result, json!({"error": "Handler timed out after 500ms"}));
    }
}
