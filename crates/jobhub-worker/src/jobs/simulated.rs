//! Placeholder workload that stands in for real business logic.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use jobhub_entity::job::Job;

use crate::executor::{JobExecutionError, JobHandler};

/// Message stored as the result of every simulated job.
pub const COMPLETED_MESSAGE: &str = "Job completed successfully";

/// Sleeps for a fixed duration, then completes with a canned message.
#[derive(Debug, Clone)]
pub struct SimulatedJobHandler {
    /// How long each job "works".
    work: Duration,
}

impl SimulatedJobHandler {
    /// Create a handler that works for `work` per job.
    pub fn new(work: Duration) -> Self {
        Self { work }
    }
}

#[async_trait]
impl JobHandler for SimulatedJobHandler {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn execute(&self, job: &Job) -> Result<Value, JobExecutionError> {
        tracing::debug!(job_id = job.id, work_ms = self.work.as_millis() as u64, "Simulating work");
        tokio::time::sleep(self.work).await;
        Ok(serde_json::json!({ "message": COMPLETED_MESSAGE }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jobhub_entity::job::JobStatus;

    #[tokio::test(start_paused = true)]
    async fn test_completes_with_message() {
        let now = Utc::now();
        let job = Job {
            id: 1,
            payload: serde_json::json!({"task": "x"}),
            status: JobStatus::Processing,
            result: None,
            created_at: now,
            updated_at: now,
        };

        let handler = SimulatedJobHandler::new(Duration::from_secs(2));
        let value = handler.execute(&job).await.unwrap();
        assert_eq!(value["message"], COMPLETED_MESSAGE);
    }
}
