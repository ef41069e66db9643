//! Cluster document browsing and validation API handlers

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::documents::{self, DocumentScope, DocumentStats};
use crate::error::{ApiError, ApiResult};
use crate::models::{Cluster, Document, DocumentAction, ValidationStatus};
use crate::pagination::Pagination;
use crate::services::validation;
use crate::AppState;

/// Common query parameters for document pages
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentsQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default)]
    pub page_size: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

fn default_page() -> i64 {
    1
}

/// Wire pagination metadata
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl PaginationMeta {
    pub fn new(pagination: Pagination, total: i64) -> Self {
        Self {
            page: pagination.page,
            page_size: pagination.page_size,
            total,
            total_pages: pagination.total_pages,
        }
    }
}

/// GET /clusters/:id/documents response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDocumentsResponse {
    pub cluster: Cluster,
    pub documents: Vec<Document>,
    pub stats: DocumentStats,
    pub pagination: PaginationMeta,
}

/// Single-document action request (POST)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentActionRequest {
    pub document_id: Uuid,
    pub action: DocumentAction,
    #[serde(default)]
    pub reclassification_note: Option<String>,
}

/// Bulk action request (PUT)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDocumentRequest {
    pub document_ids: Vec<Uuid>,
    pub action: DocumentAction,
}

/// Bulk action response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDocumentResponse {
    pub updated: u64,
}

pub(crate) fn parse_status_filter(status: Option<&str>) -> ApiResult<Option<ValidationStatus>> {
    status
        .filter(|s| !s.is_empty())
        .map(ValidationStatus::parse)
        .transpose()
        .map_err(|e| ApiError::Validation(e.to_string()))
}

/// GET /clusters/:id/documents?page=&pageSize=&status=&search=
pub async fn list_cluster_documents(
    State(state): State<AppState>,
    Path(cluster_id): Path<Uuid>,
    Query(query): Query<DocumentsQuery>,
) -> ApiResult<Json<ClusterDocumentsResponse>> {
    let cluster = crate::db::clusters::require_cluster(&state.db, cluster_id).await?;

    let status = parse_status_filter(query.status.as_deref())?;
    let page = documents::page_documents(
        &state.db,
        DocumentScope::Cluster(cluster_id),
        status,
        query.search.as_deref(),
        query.page,
        query.page_size,
    )
    .await?;

    Ok(Json(ClusterDocumentsResponse {
        cluster,
        documents: page.documents,
        stats: page.stats,
        pagination: PaginationMeta::new(page.pagination, page.total),
    }))
}

/// POST /clusters/:id/documents
///
/// Accept / delete / reclassify a single member document. The parent
/// cluster's counters are recomputed transactionally.
pub async fn validate_cluster_document(
    State(state): State<AppState>,
    Path(cluster_id): Path<Uuid>,
    Json(request): Json<DocumentActionRequest>,
) -> ApiResult<Json<Document>> {
    crate::db::clusters::require_cluster(&state.db, cluster_id).await?;

    let document = documents::require_document(&state.db, request.document_id).await?;
    if document.cluster_id != Some(cluster_id) {
        return Err(ApiError::NotFound(format!(
            "Document {} not found in cluster {}",
            request.document_id, cluster_id
        )));
    }

    let document = validation::set_validation_status(
        &state.db,
        request.document_id,
        request.action,
        request.reclassification_note.as_deref(),
    )
    .await?;

    Ok(Json(document))
}

/// PUT /clusters/:id/documents
///
/// Bulk accept / delete over member documents, all-or-nothing.
pub async fn bulk_validate_cluster_documents(
    State(state): State<AppState>,
    Path(cluster_id): Path<Uuid>,
    Json(request): Json<BulkDocumentRequest>,
) -> ApiResult<Json<BulkDocumentResponse>> {
    crate::db::clusters::require_cluster(&state.db, cluster_id).await?;

    let updated = validation::bulk_set_validation_status(
        &state.db,
        &request.document_ids,
        request.action,
        Some(cluster_id),
    )
    .await?;

    Ok(Json(BulkDocumentResponse { updated }))
}

/// Build cluster-document routes
pub fn document_routes() -> Router<AppState> {
    Router::new().route(
        "/clusters/:id/documents",
        get(list_cluster_documents)
            .post(validate_cluster_document)
            .put(bulk_validate_cluster_documents),
    )
}
