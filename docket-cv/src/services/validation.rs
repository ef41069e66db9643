//! Document validation service
//!
//! Validates reviewer input, then delegates to the document store. The
//! store keeps cluster counters consistent transactionally; this layer owns
//! the input rules (note requirements, bulk action restrictions).

use docket_common::{Error, Result};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::documents;
use crate::models::{Document, DocumentAction};

/// Apply accept / delete / reclassify to a single document
pub async fn set_validation_status(
    pool: &SqlitePool,
    document_id: Uuid,
    action: DocumentAction,
    note: Option<&str>,
) -> Result<Document> {
    let note = action.validate_note(note)?;
    let document = documents::apply_validation(pool, document_id, action, note).await?;

    tracing::info!(
        document_id = %document_id,
        action = ?action,
        status = document.validation_status.as_str(),
        "Document validation updated"
    );

    Ok(document)
}

/// Apply accept / delete to a set of documents, all-or-nothing
///
/// Reclassification is excluded from bulk actions because it needs a
/// per-document note.
pub async fn bulk_set_validation_status(
    pool: &SqlitePool,
    document_ids: &[Uuid],
    action: DocumentAction,
    required_cluster: Option<Uuid>,
) -> Result<u64> {
    if document_ids.is_empty() {
        return Err(Error::InvalidInput(
            "Bulk action requires at least one document id".to_string(),
        ));
    }
    if action == DocumentAction::Reclassify {
        return Err(Error::InvalidInput(
            "Reclassification requires a per-document note and cannot be applied in bulk"
                .to_string(),
        ));
    }

    let updated =
        documents::apply_bulk_validation(pool, document_ids, action, required_cluster).await?;

    tracing::info!(
        count = updated,
        action = ?action,
        "Bulk document validation applied"
    );

    Ok(updated)
}

/// Bulk-ingest triaged documents into a session
pub async fn ingest_documents(
    pool: &SqlitePool,
    session_id: Uuid,
    new_documents: &[documents::NewDocument],
) -> Result<u64> {
    if new_documents.is_empty() {
        return Err(Error::InvalidInput(
            "Ingestion requires at least one document".to_string(),
        ));
    }

    for doc in new_documents {
        if doc.file_name.trim().is_empty() {
            return Err(Error::InvalidInput(
                "Document fileName must be non-empty".to_string(),
            ));
        }
        if let Some(confidence) = doc.triage_confidence {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(Error::InvalidInput(format!(
                    "triageConfidence must be within [0, 1], got {}",
                    confidence
                )));
            }
        }
    }

    // Reject ingestion into unknown sessions up front
    crate::db::sessions::require_session(pool, session_id).await?;

    let ingested = documents::ingest_documents(pool, session_id, new_documents).await?;

    tracing::info!(
        session_id = %session_id,
        count = ingested,
        "Documents ingested"
    );

    Ok(ingested)
}
