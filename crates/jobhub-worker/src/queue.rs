//! Bounded in-memory work queue shared by all workers.

use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use jobhub_core::error::AppError;
use jobhub_core::result::AppResult;
use jobhub_entity::job::Job;

/// FIFO queue of job snapshots with a fixed capacity.
///
/// Producers wait in [`WorkQueue::push`] while the queue is full. Every
/// worker pulls from the same receiver, so each entry is handed to exactly
/// one worker.
#[derive(Debug)]
pub struct WorkQueue {
    /// Producer side
    sender: mpsc::Sender<Job>,
    /// Consumer side, shared by the worker pool
    receiver: Mutex<mpsc::Receiver<Job>>,
    /// Maximum number of waiting entries
    capacity: usize,
}

impl WorkQueue {
    /// Create a queue holding at most `capacity` entries. `capacity` must be
    /// at least 1.
    pub fn new(capacity: usize) -> AppResult<Self> {
        if capacity == 0 {
            return Err(AppError::configuration(
                "Work queue capacity must be at least 1",
            ));
        }
        let (sender, receiver) = mpsc::channel(capacity);
        Ok(Self {
            sender,
            receiver: Mutex::new(receiver),
            capacity,
        })
    }

    /// Append a job, waiting for space if the queue is full.
    pub async fn push(&self, job: Job) -> AppResult<()> {
        self.sender
            .send(job)
            .await
            .map_err(|_| AppError::service_unavailable("Work queue is closed"))
    }

    /// Take the next job.
    ///
    /// Waits while the queue is empty. Once `closing` fires, returns the
    /// remaining entries one by one and then `None`.
    pub async fn pop(&self, closing: &CancellationToken) -> Option<Job> {
        let mut receiver = self.receiver.lock().await;
        tokio::select! {
            biased;
            job = receiver.recv() => job,
            _ = closing.cancelled() => receiver.try_recv().ok(),
        }
    }

    /// Entries currently waiting.
    pub fn depth(&self) -> usize {
        self.capacity - self.sender.capacity()
    }

    /// Maximum number of waiting entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
