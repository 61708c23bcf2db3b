//! The job store contract and backend selection.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use jobhub_core::config::{DatabaseConfig, StoreConfig};
use jobhub_core::error::AppError;
use jobhub_core::result::AppResult;
use jobhub_core::types::PageRequest;
use jobhub_entity::job::{Job, JobId, JobStatus};

use crate::connection::connect_pool;
use crate::memory::MemoryJobStore;
use crate::migration::run_migrations;
use crate::repositories::JobRepository;

/// Durable CRUD over jobs; the single source of truth for job state.
///
/// Implementations must tolerate concurrent calls touching different jobs
/// without external locking.
#[async_trait]
pub trait JobStore: Send + Sync + std::fmt::Debug + 'static {
    /// Persist a new `queued` job and return it with its assigned id and
    /// timestamps.
    async fn create(&self, payload: Value) -> AppResult<Job>;

    /// Fetch a job by id. Fails with `NotFound` if absent.
    async fn get(&self, id: JobId) -> AppResult<Job>;

    /// List jobs newest first. An empty page is not an error.
    async fn list(&self, page: &PageRequest) -> AppResult<Vec<Job>>;

    /// Overwrite status and result unconditionally and refresh
    /// `updated_at`. Performs no lifecycle check.
    async fn update_status_and_result(
        &self,
        id: JobId,
        status: JobStatus,
        result: Option<Value>,
    ) -> AppResult<()>;

    /// Apply `expected -> next` only if the stored status is still
    /// `expected`. Fails with `Conflict` when it is not, `NotFound` when the
    /// job is absent, and `Validation` when the edge is not part of the
    /// lifecycle.
    async fn compare_and_transition(
        &self,
        id: JobId,
        expected: JobStatus,
        next: JobStatus,
        result: Option<Value>,
    ) -> AppResult<Job>;

    /// All `queued` or `processing` jobs, oldest first.
    async fn find_unfinished(&self) -> AppResult<Vec<Job>>;

    /// Number of jobs currently in `status`.
    async fn count_by_status(&self, status: JobStatus) -> AppResult<u64>;
}

/// Validate a guarded transition before it touches storage.
///
/// Returns the result value to persist: terminal states require one and
/// non-terminal states never carry one.
pub(crate) fn check_transition(
    id: JobId,
    expected: JobStatus,
    next: JobStatus,
    result: Option<Value>,
) -> AppResult<Option<Value>> {
    if !expected.can_transition_to(next) {
        return Err(AppError::validation(format!(
            "Job {id}: illegal transition {expected} -> {next}"
        )));
    }
    if next.is_terminal() {
        match result {
            Some(value) => Ok(Some(value)),
            None => Err(AppError::validation(format!(
                "Job {id}: transition to {next} requires a result"
            ))),
        }
    } else {
        Ok(None)
    }
}

/// Error for a guarded transition whose expectation no longer holds.
pub(crate) fn transition_conflict(
    id: JobId,
    expected: JobStatus,
    actual: JobStatus,
) -> AppError {
    AppError::conflict(format!(
        "Job {id}: expected status {expected}, found {actual}"
    ))
}

/// Open the job store selected by `store.backend`.
///
/// The `postgres` backend connects a pool and, when `migrate` is set,
/// applies pending migrations before returning.
pub async fn open_store(
    store: &StoreConfig,
    database: &DatabaseConfig,
    migrate: bool,
) -> AppResult<Arc<dyn JobStore>> {
    match store.backend.as_str() {
        "postgres" => {
            info!("Initializing PostgreSQL job store");
            let pool = connect_pool(database).await?;
            if migrate {
                run_migrations(&pool).await?;
            }
            Ok(Arc::new(JobRepository::new(pool)))
        }
        "memory" => {
            info!("Initializing in-memory job store");
            Ok(Arc::new(MemoryJobStore::new()))
        }
        other => Err(AppError::configuration(format!(
            "Unknown store backend: '{other}'. Supported: postgres, memory"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobhub_core::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_check_transition_rules() {
        assert_eq!(
            check_transition(1, JobStatus::Queued, JobStatus::Processing, Some(json!(1))).unwrap(),
            None
        );
        assert_eq!(
            check_transition(1, JobStatus::Processing, JobStatus::Failed, Some(json!("x")))
                .unwrap(),
            Some(json!("x"))
        );

        let err = check_transition(1, JobStatus::Queued, JobStatus::Completed, Some(json!(1)))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let err =
            check_transition(1, JobStatus::Processing, JobStatus::Completed, None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_open_store_rejects_unknown_backend() {
        let store = StoreConfig {
            backend: "sqlite".to_string(),
        };
        let err = open_store(&store, &DatabaseConfig::default(), false)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_open_store_memory() {
        let store = StoreConfig {
            backend: "memory".to_string(),
        };
        let store = open_store(&store, &DatabaseConfig::default(), true)
            .await
            .unwrap();
        let job = store.create(json!({"task": "x"})).await.unwrap();
        assert_eq!(job.status, JobStatus::Queued);
    }
}
