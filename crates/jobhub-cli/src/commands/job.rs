//! Job inspection and submission commands.
//!
//! These operate on the configured store directly. A job submitted here is
//! persisted as `queued` and picked up by the next server start.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use jobhub_core::config::AppConfig;
use jobhub_core::error::AppError;
use jobhub_core::types::PageRequest;
use jobhub_database::{JobStore, open_store};
use jobhub_entity::job::{Job, JobStatus};

use crate::output::{self, OutputFormat};

/// Arguments for job commands
#[derive(Debug, Args)]
pub struct JobArgs {
    /// Job subcommand
    #[command(subcommand)]
    pub command: JobCommand,
}

/// Job subcommands
#[derive(Debug, Subcommand)]
pub enum JobCommand {
    /// Persist a new job from a JSON payload
    Submit {
        /// JSON payload
        payload: String,
    },
    /// Show a single job
    Get {
        /// Job ID
        id: i64,
    },
    /// List jobs, newest first
    List {
        /// Page number
        #[arg(long, default_value = "1")]
        page: i64,
        /// Items per page
        #[arg(long, default_value = "10")]
        limit: i64,
    },
    /// Count jobs per status
    Stats,
}

/// Table row for a job
#[derive(Debug, Serialize, Tabled)]
struct JobRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Payload")]
    payload: String,
    #[tabled(rename = "Result")]
    result: String,
    #[tabled(rename = "Updated")]
    updated_at: String,
}

impl From<&Job> for JobRow {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id,
            status: job.status.to_string(),
            payload: output::truncate(&job.payload.to_string(), 40),
            result: job
                .result
                .as_ref()
                .map(|r| output::truncate(&r.to_string(), 40))
                .unwrap_or_else(|| "-".to_string()),
            updated_at: job.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Table row for a status count
#[derive(Debug, Serialize, Tabled)]
struct StatusCountRow {
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Jobs")]
    count: u64,
}

/// Execute job commands
pub async fn execute(
    args: &JobArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let store = open_store(&config.store, &config.database, false).await?;

    match &args.command {
        JobCommand::Submit { payload } => submit(store.as_ref(), payload, format).await,
        JobCommand::Get { id } => {
            let job = store.get(*id).await?;
            print_job(&job, format);
            Ok(())
        }
        JobCommand::List { page, limit } => {
            let jobs = store.list(&PageRequest::new(*page, *limit)).await?;
            match format {
                OutputFormat::Json => output::print_json(&jobs),
                OutputFormat::Table => {
                    let rows: Vec<JobRow> = jobs.iter().map(JobRow::from).collect();
                    output::print_list(&rows, format);
                }
            }
            Ok(())
        }
        JobCommand::Stats => {
            let mut rows = Vec::with_capacity(JobStatus::ALL.len());
            for status in JobStatus::ALL {
                rows.push(StatusCountRow {
                    status: status.to_string(),
                    count: store.count_by_status(status).await?,
                });
            }
            output::print_list(&rows, format);
            Ok(())
        }
    }
}

async fn submit(store: &dyn JobStore, payload: &str, format: OutputFormat) -> Result<(), AppError> {
    let payload: serde_json::Value = serde_json::from_str(payload)
        .map_err(|e| AppError::validation(format!("Invalid JSON payload: {e}")))?;

    let job = store.create(payload).await?;
    match format {
        OutputFormat::Json => output::print_json(&job),
        OutputFormat::Table => {
            output::print_success(&format!("Job {} queued", job.id));
        }
    }
    Ok(())
}

fn print_job(job: &Job, format: OutputFormat) {
    match format {
        OutputFormat::Json => output::print_json(job),
        OutputFormat::Table => {
            println!("Job {}:", job.id);
            output::print_kv("Status", job.status.as_str());
            output::print_kv("Payload", &job.payload.to_string());
            output::print_kv(
                "Result",
                &job.result
                    .as_ref()
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            );
            output::print_kv("Created", &job.created_at.to_rfc3339());
            output::print_kv("Updated", &job.updated_at.to_rfc3339());
        }
    }
}
