//! Cluster review API handlers

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::clusters;
use crate::error::{ApiError, ApiResult};
use crate::models::{Cluster, ClusterAction, ClusterStats, ClusterStatus};
use crate::services::cluster_actions;
use crate::AppState;

/// GET /clusters query parameters
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClustersQuery {
    pub session_id: Uuid,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub include_deleted: Option<bool>,
}

/// GET /clusters response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListClustersResponse {
    pub clusters: Vec<Cluster>,
    pub stats: ClusterStats,
}

/// POST /clusters request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterActionRequest {
    pub cluster_id: Uuid,
    pub action: ClusterAction,
    #[serde(default)]
    pub approved_name: Option<String>,
    #[serde(default)]
    pub validated_by: Option<String>,
    #[serde(default)]
    pub validator_name: Option<String>,
}

/// POST /clusters/merge request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeClustersRequest {
    pub session_id: Uuid,
    pub cluster_ids: Vec<Uuid>,
    pub new_name: String,
}

/// GET /clusters?sessionId=&status=&includeDeleted=
pub async fn list_clusters(
    State(state): State<AppState>,
    Query(query): Query<ClustersQuery>,
) -> ApiResult<Json<ListClustersResponse>> {
    // Scope check keeps unknown sessions a 404 rather than an empty list
    crate::db::sessions::require_session(&state.db, query.session_id).await?;

    let status = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(ClusterStatus::parse)
        .transpose()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let (clusters, stats) = clusters::list_clusters(
        &state.db,
        query.session_id,
        status,
        query.include_deleted.unwrap_or(false),
    )
    .await?;

    Ok(Json(ListClustersResponse { clusters, stats }))
}

/// POST /clusters
///
/// Apply approve / reject / delete to a Pending cluster.
pub async fn apply_cluster_action(
    State(state): State<AppState>,
    Json(request): Json<ClusterActionRequest>,
) -> ApiResult<Json<Cluster>> {
    let cluster = cluster_actions::apply_cluster_action(
        &state.db,
        request.cluster_id,
        request.action,
        request.approved_name,
        request.validated_by,
        request.validator_name,
    )
    .await?;

    Ok(Json(cluster))
}

/// POST /clusters/merge
pub async fn merge_clusters(
    State(state): State<AppState>,
    Json(request): Json<MergeClustersRequest>,
) -> ApiResult<Json<Cluster>> {
    let merged = cluster_actions::merge_clusters(
        &state.db,
        request.session_id,
        &request.cluster_ids,
        &request.new_name,
    )
    .await?;

    Ok(Json(merged))
}

/// Build cluster routes
pub fn cluster_routes() -> Router<AppState> {
    Router::new()
        .route("/clusters", get(list_clusters).post(apply_cluster_action))
        .route("/clusters/merge", post(merge_clusters))
}
