//! Job entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::JobStatus;

/// Store-assigned job identifier.
pub type JobId = i64;

/// A unit of submitted work and its lifecycle state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Job {
    /// Unique, monotonically assigned identifier.
    pub id: JobId,
    /// Opaque submitter payload (JSON).
    pub payload: serde_json::Value,
    /// Current lifecycle status.
    #[sqlx(try_from = "String")]
    pub status: JobStatus,
    /// Handler result, present once the job is terminal.
    pub result: Option<serde_json::Value>,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
    /// When the job last changed status.
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Whether the job reached `completed` or `failed`.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
