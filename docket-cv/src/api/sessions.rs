//! Session and ingestion API handlers

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{documents, sessions};
use crate::error::ApiResult;
use crate::models::Session;
use crate::services::validation;
use crate::AppState;

/// POST /sessions request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub name: Option<String>,
}

/// GET /sessions/:id response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummaryResponse {
    #[serde(flatten)]
    pub session: Session,
    pub document_count: i64,
    pub recluster_eligible: i64,
}

/// POST /sessions/:id/documents request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    pub documents: Vec<documents::NewDocument>,
}

/// POST /sessions/:id/documents response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub ingested: u64,
}

/// POST /sessions
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> ApiResult<Json<Session>> {
    let session = sessions::create_session(&state.db, request.name).await?;

    tracing::info!(session_id = %session.id, "Session created");

    Ok(Json(session))
}

/// GET /sessions/:id
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<SessionSummaryResponse>> {
    let session = sessions::require_session(&state.db, session_id).await?;
    let document_count = documents::count_documents(&state.db, session_id).await?;
    let recluster_eligible = documents::count_recluster_eligible(&state.db, session_id).await?;

    Ok(Json(SessionSummaryResponse {
        session,
        document_count,
        recluster_eligible,
    }))
}

/// POST /sessions/:id/documents
///
/// Bulk ingestion of classifier-triaged documents. Newly ingested documents
/// are unclustered and eligible for the next clustering pass.
pub async fn ingest_documents(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<IngestRequest>,
) -> ApiResult<Json<IngestResponse>> {
    let ingested =
        validation::ingest_documents(&state.db, session_id, &request.documents).await?;

    Ok(Json(IngestResponse { ingested }))
}

/// Build session routes
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/:id", get(get_session))
        .route("/sessions/:id/documents", post(ingest_documents))
}
