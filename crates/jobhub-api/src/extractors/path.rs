//! Typed path parameter helpers.

use jobhub_core::error::AppError;
use jobhub_entity::job::JobId;

/// Parses a job id from a path segment.
pub fn parse_job_id(s: &str) -> Result<JobId, AppError> {
    s.parse::<JobId>()
        .map_err(|_| AppError::validation(format!("Invalid job ID: {s}")))
}
