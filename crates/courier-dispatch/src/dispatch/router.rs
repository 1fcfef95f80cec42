use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::batch::BatchSummary;
use super::decision::AssignmentDecision;
use super::domain::{AssignmentMode, DriverId, JobId};
use super::repository::{AssignmentConfigSource, DispatchRepository};
use super::scoring::ScoreResult;
use super::service::DispatchService;
use crate::error::AppError;

/// Body of a manual assignment request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualAssignmentRequest {
    pub driver_id: DriverId,
    #[serde(default)]
    pub mode: Option<AssignmentMode>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AutoAssignResponse {
    pub summary: BatchSummary,
    pub decisions: Vec<AssignmentDecision>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewResponse {
    pub job_id: JobId,
    pub scores: Vec<ScoreResult>,
}

/// Router builder exposing the dispatch endpoints.
pub fn dispatch_router<R, C>(service: Arc<DispatchService<R, C>>) -> Router
where
    R: DispatchRepository + 'static,
    C: AssignmentConfigSource + 'static,
{
    Router::new()
        .route("/api/v1/dispatch/auto-assign", post(auto_assign_handler::<R, C>))
        .route(
            "/api/v1/dispatch/jobs/:job_id/assign",
            post(assign_handler::<R, C>),
        )
        .route(
            "/api/v1/dispatch/jobs/:job_id/preview",
            get(preview_handler::<R, C>),
        )
        .with_state(service)
}

pub(crate) async fn auto_assign_handler<R, C>(
    State(service): State<Arc<DispatchService<R, C>>>,
) -> Result<Json<AutoAssignResponse>, AppError>
where
    R: DispatchRepository + 'static,
    C: AssignmentConfigSource + 'static,
{
    let run = service.run_for_pending()?;
    Ok(Json(AutoAssignResponse {
        summary: run.summary,
        decisions: run.decisions,
    }))
}

/// An ineligible driver is a business outcome: 200 with the failure reason.
pub(crate) async fn assign_handler<R, C>(
    State(service): State<Arc<DispatchService<R, C>>>,
    Path(job_id): Path<String>,
    Json(request): Json<ManualAssignmentRequest>,
) -> Result<Json<AssignmentDecision>, AppError>
where
    R: DispatchRepository + 'static,
    C: AssignmentConfigSource + 'static,
{
    let job_id = JobId(job_id);
    let mode = request.mode.unwrap_or(AssignmentMode::Manual);
    let decision = service.assign_one(&job_id, &request.driver_id, mode)?;
    Ok(Json(decision))
}

pub(crate) async fn preview_handler<R, C>(
    State(service): State<Arc<DispatchService<R, C>>>,
    Path(job_id): Path<String>,
) -> Result<Json<PreviewResponse>, AppError>
where
    R: DispatchRepository + 'static,
    C: AssignmentConfigSource + 'static,
{
    let job_id = JobId(job_id);
    let scores = service.preview_scores(&job_id)?;
    Ok(Json(PreviewResponse { job_id, scores }))
}
