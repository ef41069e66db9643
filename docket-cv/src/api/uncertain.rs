//! Uncertain-document review API handlers
//!
//! Mirrors the cluster-document contract over a session's Uncertain-triaged
//! documents, which reviewers work through outside any single cluster.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::documents::{self, DocumentScope, DocumentStats};
use crate::error::ApiResult;
use crate::models::Document;
use crate::services::validation;
use crate::AppState;

use super::documents::{
    parse_status_filter, BulkDocumentRequest, BulkDocumentResponse, DocumentActionRequest,
    PaginationMeta,
};

/// GET /uncertain-docs query parameters
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UncertainQuery {
    pub session_id: Uuid,
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

/// GET /uncertain-docs response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UncertainDocumentsResponse {
    pub documents: Vec<Document>,
    pub stats: DocumentStats,
    pub pagination: PaginationMeta,
}

/// GET /uncertain-docs?sessionId=&page=&pageSize=&status=&search=
pub async fn list_uncertain_documents(
    State(state): State<AppState>,
    Query(query): Query<UncertainQuery>,
) -> ApiResult<Json<UncertainDocumentsResponse>> {
    crate::db::sessions::require_session(&state.db, query.session_id).await?;

    let status = parse_status_filter(query.status.as_deref())?;
    let page = documents::page_documents(
        &state.db,
        DocumentScope::Uncertain(query.session_id),
        status,
        query.search.as_deref(),
        query.page,
        query.page_size,
    )
    .await?;

    Ok(Json(UncertainDocumentsResponse {
        documents: page.documents,
        stats: page.stats,
        pagination: PaginationMeta::new(page.pagination, page.total),
    }))
}

/// POST /uncertain-docs
pub async fn validate_uncertain_document(
    State(state): State<AppState>,
    Json(request): Json<DocumentActionRequest>,
) -> ApiResult<Json<Document>> {
    let document = validation::set_validation_status(
        &state.db,
        request.document_id,
        request.action,
        request.reclassification_note.as_deref(),
    )
    .await?;

    Ok(Json(document))
}

/// PUT /uncertain-docs
pub async fn bulk_validate_uncertain_documents(
    State(state): State<AppState>,
    Json(request): Json<BulkDocumentRequest>,
) -> ApiResult<Json<BulkDocumentResponse>> {
    let updated = validation::bulk_set_validation_status(
        &state.db,
        &request.document_ids,
        request.action,
        None,
    )
    .await?;

    Ok(Json(BulkDocumentResponse { updated }))
}

/// Build uncertain-document routes
pub fn uncertain_routes() -> Router<AppState> {
    Router::new().route(
        "/uncertain-docs",
        get(list_uncertain_documents)
            .post(validate_uncertain_document)
            .put(bulk_validate_uncertain_documents),
    )
}
