//! Job domain entities.

pub mod model;
pub mod status;

pub use model::{Job, JobId};
pub use status::{JobStatus, ParseJobStatusError};
