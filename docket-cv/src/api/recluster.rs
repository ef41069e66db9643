//! Re-cluster trigger and polling API handlers
//!
//! GET /recluster is the 5-second polling target: a pure read of the job
//! slot plus a live canTrigger computation. POST /recluster is the only
//! state-changing entry point.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::models::{JobState, ReclusterStatus};
use crate::AppState;

/// GET /recluster query parameters
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReclusterQuery {
    pub session_id: Uuid,
}

/// POST /recluster request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRequest {
    pub session_id: Uuid,
}

/// POST /recluster response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerResponse {
    pub accepted: bool,
    pub status: JobState,
}

/// GET /recluster?sessionId=
pub async fn get_recluster_status(
    State(state): State<AppState>,
    Query(query): Query<ReclusterQuery>,
) -> ApiResult<Json<ReclusterStatus>> {
    let status = state.recluster.get_status(query.session_id).await?;
    Ok(Json(status))
}

/// POST /recluster
///
/// Rejected with Conflict when a job is already processing for the session
/// and with InvalidState when canTrigger is false. On acceptance the job is
/// processing before this returns, so the next poll observes it.
pub async fn trigger_recluster(
    State(state): State<AppState>,
    Json(request): Json<TriggerRequest>,
) -> ApiResult<Json<TriggerResponse>> {
    state.recluster.trigger(request.session_id).await?;

    Ok(Json(TriggerResponse {
        accepted: true,
        status: JobState::Processing,
    }))
}

/// Build re-cluster routes
pub fn recluster_routes() -> Router<AppState> {
    Router::new().route("/recluster", get(get_recluster_status).post(trigger_recluster))
}
