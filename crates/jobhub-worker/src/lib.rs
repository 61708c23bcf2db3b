//! Job execution for JobHub.
//!
//! This crate provides:
//! - A bounded in-memory work queue shared by all workers
//! - A dispatcher that owns a fixed pool of workers and drives each job
//!   through its lifecycle in the job store
//! - The job handler contract and an executor that bounds and isolates
//!   handler invocations
//! - Built-in handler implementations

pub mod dispatcher;
pub mod executor;
pub mod jobs;
pub mod queue;

pub use dispatcher::{Dispatcher, DispatcherStats};
pub use executor::{JobExecutionError, JobExecutor, JobHandler, JobOutcome};
pub use queue::WorkQueue;
