//! In-process job store.
//!
//! Holds every job in a map behind an async `RwLock`. Used by tests and by
//! the `memory` store backend; state is lost when the process exits.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use jobhub_core::error::AppError;
use jobhub_core::result::AppResult;
use jobhub_core::types::PageRequest;
use jobhub_entity::job::{Job, JobId, JobStatus};

use crate::store::{JobStore, check_transition, transition_conflict};

#[derive(Debug, Default)]
struct Inner {
    last_id: JobId,
    jobs: BTreeMap<JobId, Job>,
}

/// Job store kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    inner: RwLock<Inner>,
}

impl MemoryJobStore {
    /// Create an empty store. Ids start at 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of jobs held.
    pub async fn len(&self) -> usize {
        self.inner.read().await.jobs.len()
    }

    /// Whether the store holds no jobs.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn not_found(id: JobId) -> AppError {
    AppError::not_found(format!("Job {id} not found"))
}

fn touch(job: &mut Job) {
    job.updated_at = Utc::now().max(job.created_at);
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, payload: Value) -> AppResult<Job> {
        let mut inner = self.inner.write().await;
        inner.last_id += 1;

        let now = Utc::now();
        let job = Job {
            id: inner.last_id,
            payload,
            status: JobStatus::Queued,
            result: None,
            created_at: now,
            updated_at: now,
        };
        inner.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn get(&self, id: JobId) -> AppResult<Job> {
        self.inner
            .read()
            .await
            .jobs
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    async fn list(&self, page: &PageRequest) -> AppResult<Vec<Job>> {
        let inner = self.inner.read().await;
        let mut jobs: Vec<&Job> = inner.jobs.values().collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(jobs
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(page.limit() as usize)
            .cloned()
            .collect())
    }

    async fn update_status_and_result(
        &self,
        id: JobId,
        status: JobStatus,
        result: Option<Value>,
    ) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        let job = inner.jobs.get_mut(&id).ok_or_else(|| not_found(id))?;
        job.status = status;
        job.result = result;
        touch(job);
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

        let mut inner = self.inner.write().await;
        let job = inner.jobs.get_mut(&id).ok_or_else(|| not_found(id))?;
        if job.status != expected {
            return Err(transition_conflict(id, expected, job.status));
        }
        job.status = next;
        job.result = result;
        touch(job);
        Ok(job.clone())
    }

    async fn find_unfinished(&self) -> AppResult<Vec<Job>> {
        let inner = self.inner.read().await;
        let mut jobs: Vec<Job> = inner
            .jobs
            .values()
            .filter(|job| !job.is_terminal())
            .cloned()
            .collect();
        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(jobs)
    }

    async fn count_by_status(&self, status: JobStatus) -> AppResult<u64> {
        let inner = self.inner.read().await;
        Ok(inner.jobs.values().filter(|job| job.status == status).count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;
    use jobhub_core::error::ErrorKind;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_assigns_unique_ids() {
        let store = Arc::new(MemoryJobStore::new());

        let handles: Vec<_> = (0..50)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.create(json!({ "n": i })).await.unwrap().id })
            })
            .collect();
        let ids: HashSet<JobId> = futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(ids.len(), 50);
        assert_eq!(store.len().await, 50);
    }

    #[tokio::test]
    async fn test_create_starts_queued() {
        let store = MemoryJobStore::new();
        let job = store.create(json!({"task": "x"})).await.unwrap();

        assert_eq!(job.id, 1);
        assert_eq!(job.status, JobStatus::Queued);
        assert!(job.result.is_none());
        assert_eq!(job.created_at, job.updated_at);
        assert_eq!(store.get(job.id).await.unwrap(), job);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = MemoryJobStore::new();
        let err = store.get(999_999).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_list_newest_first_and_paged() {
        let store = MemoryJobStore::new();
        assert!(store.list(&PageRequest::default()).await.unwrap().is_empty());

        for i in 0..5 {
            store.create(json!({ "n": i })).await.unwrap();
        }

        let first = store.list(&PageRequest::new(1, 2)).await.unwrap();
        let ids: Vec<JobId> = first.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![5, 4]);

        let third = store.list(&PageRequest::new(3, 2)).await.unwrap();
        assert_eq!(third.len(), 1);
        assert_eq!(third[0].id, 1);

        assert!(store.list(&PageRequest::new(4, 2)).await.unwrap().is_empty());
        assert!(
            store
                .list(&PageRequest::new(100_000_000_000_000_000, 100))
                .await
                .unwrap()
                .is_empty()
        );
        assert_eq!(store.list(&PageRequest::new(1, 2)).await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_guarded_lifecycle() {
        let store = MemoryJobStore::new();
        let job = store.create(json!({})).await.unwrap();

        let claimed = store
            .compare_and_transition(job.id, JobStatus::Queued, JobStatus::Processing, None)
            .await
            .unwrap();
        assert_eq!(claimed.status, JobStatus::Processing);
        assert!(claimed.result.is_none());
        assert!(claimed.updated_at >= claimed.created_at);

        let err = store
            .compare_and_transition(job.id, JobStatus::Queued, JobStatus::Processing, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);

        let done = store
            .compare_and_transition(
                job.id,
                JobStatus::Processing,
                JobStatus::Completed,
                Some(json!({"ok": true})),
            )
            .await
            .unwrap();
        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(done.result, Some(json!({"ok": true})));

        let err = store
            .compare_and_transition(
                job.id,
                JobStatus::Processing,
                JobStatus::Failed,
                Some(json!("late")),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(store.get(job.id).await.unwrap().result, Some(json!({"ok": true})));
    }

    #[tokio::test]
    async fn test_guarded_transition_rejects_skipping_processing() {
        let store = MemoryJobStore::new();
        let job = store.create(json!({})).await.unwrap();

        let err = store
            .compare_and_transition(job.id, JobStatus::Queued, JobStatus::Completed, Some(json!(1)))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(store.get(job.id).await.unwrap().status, JobStatus::Queued);

        let err = store
            .compare_and_transition(42, JobStatus::Queued, JobStatus::Processing, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_unconditional_update_overwrites() {
        let store = MemoryJobStore::new();
        let job = store.create(json!({})).await.unwrap();

        store
            .update_status_and_result(job.id, JobStatus::Failed, Some(json!({"error": "manual"})))
            .await
            .unwrap();
        let stored = store.get(job.id).await.unwrap();
        assert_eq!(stored.status, JobStatus::Failed);
        assert_eq!(stored.result, Some(json!({"error": "manual"})));

        let err = store
            .update_status_and_result(77, JobStatus::Failed, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_find_unfinished_and_counts() {
        let store = MemoryJobStore::new();
        let a = store.create(json!({"n": 1})).await.unwrap();
        let b = store.create(json!({"n": 2})).await.unwrap();
        let c = store.create(json!({"n": 3})).await.unwrap();

        store
            .compare_and_transition(b.id, JobStatus::Queued, JobStatus::Processing, None)
            .await
            .unwrap();
        store
            .compare_and_transition(c.id, JobStatus::Queued, JobStatus::Processing, None)
            .await
            .unwrap();
        store
            .compare_and_transition(c.id, JobStatus::Processing, JobStatus::Completed, Some(json!(1)))
            .await
            .unwrap();

        let unfinished: Vec<JobId> = store
            .find_unfinished()
            .await
            .unwrap()
            .iter()
            .map(|j| j.id)
            .collect();
        assert_eq!(unfinished, vec![a.id, b.id]);

        assert_eq!(store.count_by_status(JobStatus::Queued).await.unwrap(), 1);
        assert_eq!(store.count_by_status(JobStatus::Processing).await.unwrap(), 1);
        assert_eq!(store.count_by_status(JobStatus::Completed).await.unwrap(), 1);
        assert_eq!(store.count_by_status(JobStatus::Failed).await.unwrap(), 0);
    }
}
