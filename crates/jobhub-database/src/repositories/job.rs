//! Job repository implementation.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

use jobhub_core::error::{AppError, ErrorKind};
use jobhub_core::result::AppResult;
use jobhub_core::types::PageRequest;
use jobhub_entity::job::{Job, JobId, JobStatus};

use crate::store::{JobStore, check_transition, transition_conflict};

/// PostgreSQL-backed job store.
#[derive(Debug, Clone)]
pub struct JobRepository {
    pool: PgPool,
}

impl JobRepository {
    /// Create a new job repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Current status of a job, or `None` if it does not exist.
    async fn current_status(&self, id: JobId) -> AppResult<Option<JobStatus>> {
        let status: Option<String> = sqlx::query_scalar("SELECT status FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to read job status", e))?;

        status
            .map(|s| {
                s.parse::<JobStatus>().map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Corrupt job status", e)
                })
            })
            .transpose()
    }
}

#[async_trait]
impl JobStore for JobRepository {
    async fn create(&self, payload: Value) -> AppResult<Job> {
        sqlx::query_as::<_, Job>(
            "INSERT INTO jobs (payload, status) VALUES ($1, $2) \
             RETURNING id, payload, status, result, created_at, updated_at",
        )
        .bind(&payload)
        .bind(JobStatus::Queued.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create job", e))
    }

    async fn get(&self, id: JobId) -> AppResult<Job> {
        sqlx::query_as::<_, Job>(
            "SELECT id, payload, status, result, created_at, updated_at FROM jobs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find job", e))?
        .ok_or_else(|| AppError::not_found(format!("Job {id} not found")))
    }

    async fn list(&self, page: &PageRequest) -> AppResult<Vec<Job>> {
        sqlx::query_as::<_, Job>(
            "SELECT id, payload, status, result, created_at, updated_at FROM jobs \
             ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
        )
        .bind(page.limit() as i64)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list jobs", e))
    }

    async fn update_status_and_result(
        &self,
        id: JobId,
        status: JobStatus,
        result: Option<Value>,
    ) -> AppResult<()> {
        let outcome = sqlx::query(
            "UPDATE jobs SET status = $2, result = $3, updated_at = GREATEST(NOW(), created_at) \
             WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(result.as_ref())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update job", e))?;

        if outcome.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Job {id} not found")));
        }
        Ok(())
    }

    async fn compare_and_transition(
        &self,
        id: JobId,
        expected: JobStatus,
        next: JobStatus,
        result: Option<Value>,
    ) -> AppResult<Job> {
        let result = check_transition(id, expected, next, result)?;

        let updated = sqlx::query_as::<_, Job>(
            "UPDATE jobs SET status = $3, result = $4, updated_at = GREATEST(NOW(), created_at) \
             WHERE id = $1 AND status = $2 \
             RETURNING id, payload, status, result, created_at, updated_at",
        )
        .bind(id)
        .bind(expected.as_str())
        .bind(next.as_str())
        .bind(result.as_ref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to transition job", e))?;

        match updated {
            Some(job) => Ok(job),
            None => match self.current_status(id).await? {
                Some(actual) => Err(transition_conflict(id, expected, actual)),
                None => Err(AppError::not_found(format!("Job {id} not found"))),
            },
        }
    }

    async fn find_unfinished(&self) -> AppResult<Vec<Job>> {
        sqlx::query_as::<_, Job>(
            "SELECT id, payload, status, result, created_at, updated_at FROM jobs \
             WHERE status IN ($1, $2) ORDER BY created_at ASC, id ASC",
        )
        .bind(JobStatus::Queued.as_str())
        .bind(JobStatus::Processing.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find unfinished jobs", e)
        })
    }

    async fn count_by_status(&self, status: JobStatus) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE status = $1")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count jobs", e))?;
        Ok(count as u64)
    }
}
