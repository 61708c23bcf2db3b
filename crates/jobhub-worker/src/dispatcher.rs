//! Dispatcher: owns the work queue and a fixed pool of workers.
//!
//! A job reaches a worker as a snapshot. The worker claims it with a guarded
//! `queued -> processing` transition, runs the handler through the
//! [`JobExecutor`], then records the outcome with a guarded
//! `processing -> completed | failed` transition. Whatever fails along the
//! way is logged and the worker moves on to the next entry.
//!
//! Every job a worker holds is registered in the pool's in-flight set before
//! the claim and released after the final write, so a recovered
//! `processing` snapshot is never resumed while a live worker of this pool
//! still runs it.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use jobhub_core::config::WorkerConfig;
use jobhub_core::error::{AppError, ErrorKind};
use jobhub_core::result::AppResult;
use jobhub_database::JobStore;
use jobhub_entity::job::{Job, JobId, JobStatus};

use crate::executor::{JobExecutor, JobHandler};
use crate::queue::WorkQueue;

/// Point-in-time counters for a dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatcherStats {
    /// Number of workers in the pool
    pub workers: usize,
    /// Entries waiting in the queue
    pub queue_depth: usize,
    /// Jobs whose outcome was recorded
    pub processed: u64,
    /// Jobs recorded as completed
    pub completed: u64,
    /// Jobs recorded as failed
    pub failed: u64,
    /// Entries dropped because the claim or the final write did not succeed
    pub abandoned: u64,
}

#[derive(Debug, Default)]
struct Counters {
    processed: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    abandoned: AtomicU64,
}

/// Runs jobs from a bounded queue on a fixed number of workers.
#[derive(Debug)]
pub struct Dispatcher {
    /// Instance identifier used in logs
    id: String,
    /// Source of truth for job state
    store: Arc<dyn JobStore>,
    /// Handler invocation
    executor: JobExecutor,
    /// Pending work
    queue: Arc<WorkQueue>,
    /// Pool size
    concurrency: usize,
    /// Fired when shutdown begins
    closing: CancellationToken,
    /// Tracks the worker tasks
    tracker: TaskTracker,
    /// Set once the pool has been spawned
    started: AtomicBool,
    /// Jobs currently held by a worker
    in_flight: Arc<InFlight>,
    counters: Arc<Counters>,
}

impl Dispatcher {
    /// Create a dispatcher. Workers are not spawned until [`Dispatcher::start`].
    pub fn new(
        store: Arc<dyn JobStore>,
        handler: Arc<dyn JobHandler>,
        config: &WorkerConfig,
    ) -> AppResult<Self> {
        if config.concurrency == 0 {
            return Err(AppError::configuration(
                "Worker concurrency must be at least 1",
            ));
        }

        let id = format!("dispatcher-{}", &uuid::Uuid::new_v4().to_string()[..8]);
        Ok(Self {
            id,
            store,
            executor: JobExecutor::new(handler, config.handler_timeout()),
            queue: Arc::new(WorkQueue::new(config.queue_capacity)?),
            concurrency: config.concurrency,
            closing: CancellationToken::new(),
            tracker: TaskTracker::new(),
            started: AtomicBool::new(false),
            in_flight: Arc::new(InFlight::default()),
            counters: Arc::new(Counters::default()),
        })
    }

    /// Instance identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Spawn the worker pool. Fails if already started or shut down.
    pub fn start(&self) -> AppResult<()> {
        if self.closing.is_cancelled() {
            return Err(AppError::service_unavailable("Dispatcher is shut down"));
        }
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(AppError::conflict("Dispatcher already started"));
        }

        for index in 0..self.concurrency {
            let worker = Worker {
                index,
                in_flight: Arc::clone(&self.in_flight),
                store: Arc::clone(&self.store),
                executor: self.executor.clone(),
                queue: Arc::clone(&self.queue),
                closing: self.closing.clone(),
                counters: Arc::clone(&self.counters),
            };
            self.tracker.spawn(worker.run());
        }

        tracing::info!(
            "Dispatcher '{}' started with concurrency={}, queue_capacity={}, handler='{}'",
            self.id,
            self.concurrency,
            self.queue.capacity(),
            self.executor.handler_name()
        );
        Ok(())
    }

    /// Enqueue a job snapshot for execution.
    ///
    /// Waits while the queue is full. Fails with `ServiceUnavailable` once
    /// shutdown has begun; the job then stays in the store as it is.
    pub async fn submit(&self, job: Job) -> AppResult<()> {
        if self.closing.is_cancelled() {
            return Err(rejected(job.id));
        }

        let job_id = job.id;
        tokio::select! {
            biased;
            _ = self.closing.cancelled() => Err(rejected(job_id)),
            pushed = self.queue.push(job) => {
                pushed?;
                tracing::debug!(job_id, queue_depth = self.queue.depth(), "Job enqueued");
                Ok(())
            }
        }
    }

    /// Re-enqueue every `queued` or `processing` job found in the store.
    ///
    /// Must run after [`Dispatcher::start`] so a backlog larger than the
    /// queue capacity can drain. Returns the number of jobs enqueued.
    pub async fn recover(&self) -> AppResult<usize> {
        if !self.started.load(Ordering::SeqCst) {
            return Err(AppError::conflict(
                "Dispatcher must be started before recovering jobs",
            ));
        }

        let jobs = self.store.find_unfinished().await?;
        let total = jobs.len();
        if total > 0 {
            tracing::info!("Recovering {} unfinished job(s)", total);
        }

        for job in jobs {
            self.submit(job).await?;
        }
        Ok(total)
    }

    /// Stop accepting work, let the workers drain the queue, and wait up to
    /// `grace` for them to exit. Returns whether every worker finished.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        tracing::info!(
            "Dispatcher '{}' shutting down; {} job(s) left in queue",
            self.id,
            self.queue.depth()
        );

        self.closing.cancel();
        self.tracker.close();

        let drained = tokio::time::timeout(grace, self.tracker.wait())
            .await
            .is_ok();
        if !drained {
            tracing::warn!(
                remaining_workers = self.tracker.len(),
                grace_secs = grace.as_secs(),
                "Shutdown grace period elapsed with workers still running"
            );
        }

        let stats = self.stats();
        tracing::info!(
            processed = stats.processed,
            completed = stats.completed,
            failed = stats.failed,
            abandoned = stats.abandoned,
            "Dispatcher '{}' stopped",
            self.id
        );
        drained
    }

    /// Whether [`Dispatcher::submit`] still accepts work.
    pub fn is_accepting(&self) -> bool {
        !self.closing.is_cancelled()
    }

    /// Entries currently waiting in the queue.
    pub fn queue_depth(&self) -> usize {
        self.queue.depth()
    }

    /// Snapshot of the dispatcher counters.
    pub fn stats(&self) -> DispatcherStats {
        DispatcherStats {
            workers: self.concurrency,
            queue_depth: self.queue.depth(),
            processed: self.counters.processed.load(Ordering::Relaxed),
            completed: self.counters.completed.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            abandoned: self.counters.abandoned.load(Ordering::Relaxed),
        }
    }
}

/// Ids of the jobs the pool's workers currently hold.
#[derive(Debug, Default)]
struct InFlight(Mutex<HashSet<JobId>>);

impl InFlight {
    /// Register `job_id`, or `None` if another worker already holds it.
    fn acquire(&self, job_id: JobId) -> Option<InFlightGuard<'_>> {
        let mut held = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        held.insert(job_id).then(|| InFlightGuard {
            set: self,
            job_id,
        })
    }
}

/// Releases its job id when dropped.
#[derive(Debug)]
struct InFlightGuard<'a> {
    set: &'a InFlight,
    job_id: JobId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set
            .0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.job_id);
    }
}

fn rejected(job_id: JobId) -> AppError {
    AppError::service_unavailable(format!(
        "Dispatcher is shutting down; job {job_id} was not enqueued"
    ))
}

/// One member of the pool.
#[derive(Debug)]
struct Worker {
    index: usize,
    in_flight: Arc<InFlight>,
    store: Arc<dyn JobStore>,
    executor: JobExecutor,
    queue: Arc<WorkQueue>,
    closing: CancellationToken,
    counters: Arc<Counters>,
}

impl Worker {
    async fn run(self) {
        tracing::debug!(worker = self.index, "Worker started");

        while let Some(job) = self.queue.pop(&self.closing).await {
            self.process(job).await;
        }

        tracing::debug!(worker = self.index, "Worker stopped");
    }

    async fn process(&self, job: Job) {
        let job_id = job.id;

        if job.status.is_terminal() {
            tracing::debug!(job_id, status = %job.status, "Skipping finished job");
            self.counters.abandoned.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let Some(_held) = self.in_flight.acquire(job_id) else {
            tracing::debug!(job_id, "Skipping job held by another worker");
            self.counters.abandoned.fetch_add(1, Ordering::Relaxed);
            return;
        };

        let claimed = match job.status {
            JobStatus::Queued => {
                match self
                    .store
                    .compare_and_transition(job_id, JobStatus::Queued, JobStatus::Processing, None)
                    .await
                {
                    Ok(claimed) => claimed,
                    Err(e) => return self.abandon(job_id, "claim", &e),
                }
            }
            // Left behind by an earlier process; resume without a new claim
            // unless the store shows it finished since the snapshot was taken.
            _ => match self.store.get(job_id).await {
                Ok(current) if current.status == JobStatus::Processing => {
                    tracing::info!(worker = self.index, job_id, "Resuming interrupted job");
                    current
                }
                Ok(current) => {
                    tracing::debug!(job_id, status = %current.status, "Skipping finished job");
                    self.counters.abandoned.fetch_add(1, Ordering::Relaxed);
                    return;
                }
                Err(e) => return self.abandon(job_id, "resume", &e),
            },
        };

        tracing::info!(worker = self.index, job_id, "Job {} set to processing", job_id);

        let outcome = self.executor.execute(&claimed).await;
        let status = outcome.status;

        match self
            .store
            .compare_and_transition(job_id, JobStatus::Processing, status, Some(outcome.result))
            .await
        {
            Ok(_) => {
                self.counters.processed.fetch_add(1, Ordering::Relaxed);
                if status == JobStatus::Completed {
                    self.counters.completed.fetch_add(1, Ordering::Relaxed);
                } else {
                    self.counters.failed.fetch_add(1, Ordering::Relaxed);
                }
                tracing::info!(worker = self.index, job_id, "Job {} {}", job_id, status);
            }
            Err(e) => self.abandon(job_id, "record outcome", &e),
        }
    }

    fn abandon(&self, job_id: JobId, step: &str, error: &AppError) {
        self.counters.abandoned.fetch_add(1, Ordering::Relaxed);
        if error.is(ErrorKind::Conflict) {
            tracing::warn!(worker = self.index, job_id, step, %error, "Job changed underneath worker");
        } else {
            tracing::error!(worker = self.index, job_id, step, %error, "Job store failure");
        }
    }
}
