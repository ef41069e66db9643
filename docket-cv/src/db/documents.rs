//! Document store: paginated browsing and validation transitions

use chrono::Utc;
use docket_common::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::models::{Document, DocumentAction, TriageStatus, ValidationStatus};
use crate::pagination::{calculate_pagination, Pagination};

use super::clusters::recompute_counts;
use super::sessions::{parse_optional_timestamp, parse_timestamp, parse_uuid};

/// Which documents a page query covers
#[derive(Debug, Clone, Copy)]
pub enum DocumentScope {
    /// Members of one cluster
    Cluster(Uuid),
    /// A session's Uncertain-triaged documents, across clusters
    Uncertain(Uuid),
}

/// One page of documents with scope-wide aggregates
#[derive(Debug)]
pub struct DocumentPage {
    pub documents: Vec<Document>,
    pub stats: DocumentStats,
    pub pagination: Pagination,
    pub total: i64,
}

/// Validation-status breakdown over the whole scope (not just the page)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStats {
    pub total: i64,
    pub accepted: i64,
    pub deleted: i64,
    pub reclassified: i64,
    pub pending: i64,
}

/// Document supplied by the ingestion endpoint
///
/// Triage fields come from the external classifier; everything else is file
/// metadata captured at import time.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDocument {
    pub file_name: String,
    #[serde(default)]
    pub file_extension: Option<String>,
    #[serde(default)]
    pub text_preview: Option<String>,
    #[serde(default)]
    pub email_subject: Option<String>,
    #[serde(default)]
    pub email_sender: Option<String>,
    #[serde(default)]
    pub email_date: Option<chrono::DateTime<Utc>>,
    #[serde(default)]
    pub triage_status: Option<TriageStatus>,
    #[serde(default)]
    pub triage_confidence: Option<f64>,
    #[serde(default)]
    pub triage_reason: Option<String>,
}

/// Fetch one page of documents with filtering and free-text search
///
/// Search matches fileName and emailSubject (case-insensitive LIKE, with
/// wildcards escaped).
pub async fn page_documents(
    pool: &SqlitePool,
    scope: DocumentScope,
    status: Option<ValidationStatus>,
    search: Option<&str>,
    page: i64,
    page_size: Option<i64>,
) -> Result<DocumentPage> {
    let (scope_clause, scope_id) = match scope {
        DocumentScope::Cluster(cluster_id) => ("cluster_id = ?", cluster_id),
        DocumentScope::Uncertain(session_id) => {
            ("session_id = ? AND triage_status = 'Uncertain'", session_id)
        }
    };

    let mut where_clause = format!("WHERE {}", scope_clause);
    if status.is_some() {
        where_clause.push_str(" AND validation_status = ?");
    }
    let pattern = search.filter(|s| !s.trim().is_empty()).map(like_pattern);
    if pattern.is_some() {
        where_clause
            .push_str(" AND (file_name LIKE ? ESCAPE '\\' OR email_subject LIKE ? ESCAPE '\\')");
    }

    let scope_param = scope_id.to_string();

    let count_sql = format!("SELECT COUNT(*) AS n FROM documents {}", where_clause);
    let total: i64 = bind_filters(sqlx::query(&count_sql), &scope_param, status, &pattern)
        .fetch_one(pool)
        .await?
        .get("n");

    let pagination = calculate_pagination(total, page, page_size);

    let page_sql = format!(
        "SELECT * FROM documents {} ORDER BY file_name, guid LIMIT {} OFFSET {}",
        where_clause, pagination.page_size, pagination.offset
    );
    let rows = bind_filters(sqlx::query(&page_sql), &scope_param, status, &pattern)
        .fetch_all(pool)
        .await?;
    let documents = rows
        .iter()
        .map(document_from_row)
        .collect::<Result<Vec<_>>>()?;

    // Stats cover the scope without the status/search filters so the client
    // can render breakdown tabs
    let stats_sql = format!(
        r#"
        SELECT
            COUNT(*) AS total,
            COALESCE(SUM(CASE WHEN validation_status = 'Accepted' THEN 1 ELSE 0 END), 0) AS accepted,
            COALESCE(SUM(CASE WHEN validation_status = 'Deleted' THEN 1 ELSE 0 END), 0) AS deleted,
            COALESCE(SUM(CASE WHEN validation_status = 'Reclassified' THEN 1 ELSE 0 END), 0) AS reclassified,
            COALESCE(SUM(CASE WHEN validation_status = 'Pending' THEN 1 ELSE 0 END), 0) AS pending
        FROM documents WHERE {}
        "#,
        scope_clause
    );
    let stats_row = sqlx::query(&stats_sql)
        .bind(scope_id.to_string())
        .fetch_one(pool)
        .await?;
    let stats = DocumentStats {
        total: stats_row.get("total"),
        accepted: stats_row.get("accepted"),
        deleted: stats_row.get("deleted"),
        reclassified: stats_row.get("reclassified"),
        pending: stats_row.get("pending"),
    };

    Ok(DocumentPage {
        documents,
        stats,
        pagination,
        total,
    })
}

/// Load a document by id
pub async fn load_document(pool: &SqlitePool, document_id: Uuid) -> Result<Option<Document>> {
    let row = sqlx::query("SELECT * FROM documents WHERE guid = ?")
        .bind(document_id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(document_from_row).transpose()
}

/// Load a document, failing with NotFound when absent
pub async fn require_document(pool: &SqlitePool, document_id: Uuid) -> Result<Document> {
    load_document(pool, document_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Document not found: {}", document_id)))
}

/// Apply a validation action to one document
///
/// The parent cluster's counters are recomputed in the same transaction, and
/// the document becomes eligible for the next re-clustering pass. The note
/// must already have been validated against the action.
pub async fn apply_validation(
    pool: &SqlitePool,
    document_id: Uuid,
    action: DocumentAction,
    note: Option<String>,
) -> Result<Document> {
    let mut tx = pool.begin().await?;

    let cluster_id: Option<String> =
        sqlx::query("SELECT cluster_id FROM documents WHERE guid = ?")
            .bind(document_id.to_string())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Document not found: {}", document_id)))?
            .get("cluster_id");

    sqlx::query(
        r#"
        UPDATE documents
        SET validation_status = ?, reclassification_note = ?, validated_at = ?,
            recluster_eligible = 1
        WHERE guid = ?
        "#,
    )
    .bind(action.target_status().as_str())
    .bind(&note)
    .bind(Utc::now().to_rfc3339())
    .bind(document_id.to_string())
    .execute(&mut *tx)
    .await?;

    if let Some(cluster_id) = cluster_id {
        recompute_counts(&mut *tx, parse_uuid(cluster_id)?).await?;
    }

    tx.commit().await?;

    require_document(pool, document_id).await
}

/// Apply an accept/delete action to a set of documents, all-or-nothing
///
/// Any unknown id fails the whole batch; nothing is applied. When
/// `required_cluster` is set, every document must be a member of that
/// cluster. Every affected cluster's counters are recomputed in the same
/// transaction.
pub async fn apply_bulk_validation(
    pool: &SqlitePool,
    document_ids: &[Uuid],
    action: DocumentAction,
    required_cluster: Option<Uuid>,
) -> Result<u64> {
    let mut tx = pool.begin().await?;

    let mut affected_clusters: Vec<Uuid> = Vec::new();
    for document_id in document_ids {
        let cluster_id: Option<String> =
            sqlx::query("SELECT cluster_id FROM documents WHERE guid = ?")
                .bind(document_id.to_string())
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| Error::NotFound(format!("Document not found: {}", document_id)))?
                .get("cluster_id");

        let cluster_id = cluster_id.map(parse_uuid).transpose()?;

        if let Some(required) = required_cluster {
            if cluster_id != Some(required) {
                return Err(Error::NotFound(format!(
                    "Document {} not found in cluster {}",
                    document_id, required
                )));
            }
        }

        if let Some(cluster_id) = cluster_id {
            if !affected_clusters.contains(&cluster_id) {
                affected_clusters.push(cluster_id);
            }
        }
    }

    let placeholders = vec!["?"; document_ids.len()].join(", ");
    let sql = format!(
        r#"
        UPDATE documents
        SET validation_status = ?, reclassification_note = NULL, validated_at = ?,
            recluster_eligible = 1
        WHERE guid IN ({})
        "#,
        placeholders
    );
    let mut query = sqlx::query(&sql)
        .bind(action.target_status().as_str())
        .bind(Utc::now().to_rfc3339());
    for document_id in document_ids {
        query = query.bind(document_id.to_string());
    }
    let updated = query.execute(&mut *tx).await?.rows_affected();

    for cluster_id in &affected_clusters {
        recompute_counts(&mut *tx, *cluster_id).await?;
    }

    tx.commit().await?;

    Ok(updated)
}

/// Bulk-insert triaged documents for a session
pub async fn ingest_documents(
    pool: &SqlitePool,
    session_id: Uuid,
    documents: &[NewDocument],
) -> Result<u64> {
    let mut tx = pool.begin().await?;
    let now = Utc::now().to_rfc3339();

    for doc in documents {
        sqlx::query(
            r#"
            INSERT INTO documents (
                guid, session_id, cluster_id, file_name, file_extension, text_preview,
                email_subject, email_sender, email_date,
                triage_status, triage_confidence, triage_reason,
                validation_status, recluster_eligible, created_at
            ) VALUES (?, ?, NULL, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'Pending', 1, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(session_id.to_string())
        .bind(&doc.file_name)
        .bind(&doc.file_extension)
        .bind(&doc.text_preview)
        .bind(&doc.email_subject)
        .bind(&doc.email_sender)
        .bind(doc.email_date.map(|dt| dt.to_rfc3339()))
        .bind(doc.triage_status.map(|s| s.as_str()))
        .bind(doc.triage_confidence)
        .bind(&doc.triage_reason)
        .bind(&now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(documents.len() as u64)
}

/// Total documents in a session
pub async fn count_documents(pool: &SqlitePool, session_id: Uuid) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE session_id = ?")
        .bind(session_id.to_string())
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Count documents whose validation state changed since the last pass
/// (or that have never been clustered); drives canTrigger
pub async fn count_recluster_eligible(pool: &SqlitePool, session_id: Uuid) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM documents WHERE session_id = ? AND recluster_eligible = 1",
    )
    .bind(session_id.to_string())
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Load every recluster-eligible document for a session
pub async fn load_recluster_eligible(
    pool: &SqlitePool,
    session_id: Uuid,
) -> Result<Vec<Document>> {
    let rows = sqlx::query(
        "SELECT * FROM documents WHERE session_id = ? AND recluster_eligible = 1
         ORDER BY file_name, guid",
    )
    .bind(session_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(document_from_row).collect()
}

/// Clear eligibility flags after a completed pass (runs inside the pass
/// transaction)
pub async fn clear_recluster_flags(
    conn: &mut SqliteConnection,
    session_id: Uuid,
) -> Result<()> {
    sqlx::query("UPDATE documents SET recluster_eligible = 0 WHERE session_id = ?")
        .bind(session_id.to_string())
        .execute(conn)
        .await?;

    Ok(())
}

/// Drop documents out of their cluster (Deleted documents leave clustering)
pub async fn unassign_documents(
    conn: &mut SqliteConnection,
    document_ids: &[Uuid],
) -> Result<()> {
    if document_ids.is_empty() {
        return Ok(());
    }

    let placeholders = vec!["?"; document_ids.len()].join(", ");
    let sql = format!(
        "UPDATE documents SET cluster_id = NULL WHERE guid IN ({})",
        placeholders
    );
    let mut query = sqlx::query(&sql);
    for document_id in document_ids {
        query = query.bind(document_id.to_string());
    }
    query.execute(conn).await?;

    Ok(())
}

/// Clusters touched by a set of documents (for counter recomputation)
pub async fn clusters_of_documents(
    conn: &mut SqliteConnection,
    document_ids: &[Uuid],
) -> Result<Vec<Uuid>> {
    if document_ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; document_ids.len()].join(", ");
    let sql = format!(
        "SELECT DISTINCT cluster_id FROM documents
         WHERE guid IN ({}) AND cluster_id IS NOT NULL",
        placeholders
    );
    let mut query = sqlx::query(&sql);
    for document_id in document_ids {
        query = query.bind(document_id.to_string());
    }
    let rows = query.fetch_all(conn).await?;

    rows.into_iter()
        .map(|row| parse_uuid(row.get("cluster_id")))
        .collect()
}

fn bind_filters<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    scope_param: &'q str,
    status: Option<ValidationStatus>,
    pattern: &'q Option<String>,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    let mut query = query.bind(scope_param);
    if let Some(status) = status {
        query = query.bind(status.as_str());
    }
    if let Some(pattern) = pattern {
        query = query.bind(pattern.as_str()).bind(pattern.as_str());
    }
    query
}

fn like_pattern(search: &str) -> String {
    let escaped = search
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

pub(crate) fn document_from_row(row: &SqliteRow) -> Result<Document> {
    let validation_status: String = row.get("validation_status");
    let triage_status: Option<String> = row.get("triage_status");

    Ok(Document {
        id: parse_uuid(row.get("guid"))?,
        session_id: parse_uuid(row.get("session_id"))?,
        cluster_id: row
            .get::<Option<String>, _>("cluster_id")
            .map(parse_uuid)
            .transpose()?,
        file_name: row.get("file_name"),
        file_extension: row.get("file_extension"),
        text_preview: row.get("text_preview"),
        email_subject: row.get("email_subject"),
        email_sender: row.get("email_sender"),
        email_date: parse_optional_timestamp(row.get("email_date"))?,
        triage_status: triage_status
            .map(|s| TriageStatus::parse(&s))
            .transpose()?,
        triage_confidence: row.get("triage_confidence"),
        triage_reason: row.get("triage_reason"),
        validation_status: ValidationStatus::parse(&validation_status)?,
        reclassification_note: row.get("reclassification_note"),
        validated_at: parse_optional_timestamp(row.get("validated_at"))?,
        created_at: parse_timestamp(row.get("created_at"))?,
    })
}
