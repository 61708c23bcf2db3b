//! Job submission and query handlers.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde_json::Value;

use jobhub_core::error::AppError;
use jobhub_entity::job::Job;

use crate::error::ApiResult;
use crate::extractors::PaginationParams;
use crate::extractors::path::parse_job_id;
use crate::state::AppState;

/// POST /jobs
///
/// Persists the body as a new `queued` job and hands it to the worker pool.
pub async fn submit_job(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Job>)> {
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::validation(format!("Invalid JSON body: {e}")))?;

    let job = state.store.create(payload).await?;
    tracing::info!(job_id = job.id, "Job {} created", job.id);

    match &state.dispatcher {
        Some(dispatcher) => dispatcher.submit(job.clone()).await?,
        None => tracing::debug!(job_id = job.id, "Workers disabled; job left for recovery"),
    }

    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /jobs/{id}
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Job>> {
    let id = parse_job_id(&id)?;
    let job = state.store.get(id).await?;
    Ok(Json(job))
}

/// GET /jobs?page=&limit=
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> ApiResult<Json<Vec<Job>>> {
    let page = params.into_page_request();
    let jobs = state.store.list(&page).await?;
    Ok(Json(jobs))
}
