//! Cluster store and review transitions
//!
//! Every mutation that touches member documents recomputes the persisted
//! validation counters inside the same transaction; a half-applied mutation
//! (document status changed but cluster counters stale) must not be
//! observable even under concurrent requests.

use chrono::{DateTime, Utc};
use docket_common::{Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::models::cluster::validate_transition;
use crate::models::{Cluster, ClusterAction, ClusterStats, ClusterStatus, ValidationCounts};

use super::sessions::{parse_optional_timestamp, parse_timestamp, parse_uuid};

/// List a session's live (non-superseded) clusters with aggregate stats
///
/// Deleted clusters are excluded from both the list and the stats unless
/// `include_deleted` is set or the status filter explicitly asks for them.
pub async fn list_clusters(
    pool: &SqlitePool,
    session_id: Uuid,
    status: Option<ClusterStatus>,
    include_deleted: bool,
) -> Result<(Vec<Cluster>, ClusterStats)> {
    let show_deleted = include_deleted || status == Some(ClusterStatus::Deleted);

    let mut sql = String::from(
        "SELECT * FROM clusters WHERE session_id = ? AND superseded_at IS NULL",
    );
    if !show_deleted {
        sql.push_str(" AND status != 'Deleted'");
    }
    if status.is_some() {
        sql.push_str(" AND status = ?");
    }
    sql.push_str(" ORDER BY created_at, guid");

    let mut query = sqlx::query(&sql).bind(session_id.to_string());
    if let Some(status) = status {
        query = query.bind(status.as_str());
    }

    let rows = query.fetch_all(pool).await?;
    let clusters = rows
        .iter()
        .map(cluster_from_row)
        .collect::<Result<Vec<_>>>()?;

    // Stats cover the whole live set regardless of the status filter
    let stats_sql = format!(
        r#"
        SELECT
            COUNT(*) AS total,
            COALESCE(SUM(CASE WHEN status = 'Pending' THEN 1 ELSE 0 END), 0) AS pending,
            COALESCE(SUM(CASE WHEN status = 'Approved' THEN 1 ELSE 0 END), 0) AS approved,
            COALESCE(SUM(CASE WHEN status = 'Rejected' THEN 1 ELSE 0 END), 0) AS rejected,
            COALESCE(SUM(doc_count), 0) AS total_documents
        FROM clusters
        WHERE session_id = ? AND superseded_at IS NULL{}
        "#,
        if show_deleted { "" } else { " AND status != 'Deleted'" }
    );

    let stats_row = sqlx::query(&stats_sql)
        .bind(session_id.to_string())
        .fetch_one(pool)
        .await?;

    let stats = ClusterStats {
        total: stats_row.get("total"),
        pending: stats_row.get("pending"),
        approved: stats_row.get("approved"),
        rejected: stats_row.get("rejected"),
        total_documents: stats_row.get("total_documents"),
    };

    Ok((clusters, stats))
}

/// Load a cluster by id
pub async fn load_cluster(pool: &SqlitePool, cluster_id: Uuid) -> Result<Option<Cluster>> {
    let row = sqlx::query("SELECT * FROM clusters WHERE guid = ?")
        .bind(cluster_id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(cluster_from_row).transpose()
}

/// Load a cluster, failing with NotFound when absent
pub async fn require_cluster(pool: &SqlitePool, cluster_id: Uuid) -> Result<Cluster> {
    load_cluster(pool, cluster_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Cluster not found: {}", cluster_id)))
}

/// Apply a review action (approve / reject / delete) to a Pending cluster
///
/// The UPDATE is guarded on `status = 'Pending'` so two concurrent actions
/// cannot both succeed; the loser observes InvalidState.
pub async fn apply_action(
    pool: &SqlitePool,
    cluster_id: Uuid,
    action: ClusterAction,
    approved_name: Option<String>,
    validated_by: &str,
    validator_name: &str,
) -> Result<Cluster> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query("SELECT * FROM clusters WHERE guid = ?")
        .bind(cluster_id.to_string())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Cluster not found: {}", cluster_id)))?;
    let cluster = cluster_from_row(&row)?;

    if cluster.superseded_at.is_some() {
        return Err(Error::InvalidState(format!(
            "Cluster {} has been retired and is immutable",
            cluster_id
        )));
    }

    let new_status = validate_transition(cluster.status, action)?;

    // Approve records the final name, falling back to the suggestion
    let approved_name = match action {
        ClusterAction::Approve => Some(
            approved_name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| cluster.suggested_name.clone()),
        ),
        ClusterAction::Reject | ClusterAction::Delete => None,
    };

    let validated_at = Utc::now();
    let result = sqlx::query(
        r#"
        UPDATE clusters
        SET status = ?, approved_name = ?, validated_by = ?, validated_at = ?, validator_name = ?
        WHERE guid = ? AND status = 'Pending' AND superseded_at IS NULL
        "#,
    )
    .bind(new_status.as_str())
    .bind(&approved_name)
    .bind(validated_by)
    .bind(validated_at.to_rfc3339())
    .bind(validator_name)
    .bind(cluster_id.to_string())
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        // Lost a race with another reviewer action
        return Err(Error::InvalidState(format!(
            "Cluster {} is no longer Pending",
            cluster_id
        )));
    }

    tx.commit().await?;

    require_cluster(pool, cluster_id).await
}

/// Merge ≥2 clusters into one new Pending cluster owning the union of their
/// documents; source clusters are retired
///
/// Atomic: either all sources retire and the new cluster is created, or
/// nothing changes. The document total count is conserved.
pub async fn merge_clusters(
    pool: &SqlitePool,
    session_id: Uuid,
    cluster_ids: &[Uuid],
    new_name: &str,
) -> Result<Cluster> {
    let mut tx = pool.begin().await?;

    let pass: i64 = sqlx::query_scalar("SELECT clustering_pass FROM sessions WHERE guid = ?")
        .bind(session_id.to_string())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Session not found: {}", session_id)))?;

    for cluster_id in cluster_ids {
        let row = sqlx::query("SELECT session_id, superseded_at FROM clusters WHERE guid = ?")
            .bind(cluster_id.to_string())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Cluster not found: {}", cluster_id)))?;

        let owner: String = row.get("session_id");
        if owner != session_id.to_string() {
            return Err(Error::NotFound(format!(
                "Cluster {} not found in session {}",
                cluster_id, session_id
            )));
        }
        let superseded: Option<String> = row.get("superseded_at");
        if superseded.is_some() {
            return Err(Error::InvalidState(format!(
                "Cluster {} has already been retired",
                cluster_id
            )));
        }
    }

    let now = Utc::now();
    let merged_id = insert_cluster(
        &mut *tx,
        session_id,
        pass.max(1),
        new_name,
        None,
        Some(format!("Merged from {} clusters", cluster_ids.len())),
        now,
    )
    .await?;

    let placeholders = vec!["?"; cluster_ids.len()].join(", ");

    let reassign_sql = format!(
        "UPDATE documents SET cluster_id = ? WHERE cluster_id IN ({})",
        placeholders
    );
    let mut reassign = sqlx::query(&reassign_sql).bind(merged_id.to_string());
    for cluster_id in cluster_ids {
        reassign = reassign.bind(cluster_id.to_string());
    }
    reassign.execute(&mut *tx).await?;

    let retire_sql = format!(
        "UPDATE clusters SET superseded_at = ? WHERE guid IN ({})",
        placeholders
    );
    let mut retire = sqlx::query(&retire_sql).bind(now.to_rfc3339());
    for cluster_id in cluster_ids {
        retire = retire.bind(cluster_id.to_string());
    }
    retire.execute(&mut *tx).await?;

    recompute_counts(&mut *tx, merged_id).await?;
    for cluster_id in cluster_ids {
        recompute_counts(&mut *tx, *cluster_id).await?;
    }

    tx.commit().await?;

    require_cluster(pool, merged_id).await
}

/// Insert a new Pending cluster (merge and clustering passes)
pub async fn insert_cluster(
    conn: &mut SqliteConnection,
    session_id: Uuid,
    pass: i64,
    suggested_name: &str,
    suggested_name_en: Option<&str>,
    description: Option<String>,
    created_at: DateTime<Utc>,
) -> Result<Uuid> {
    let cluster_id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO clusters (
            guid, session_id, suggested_name, suggested_name_en, description,
            status, clustering_pass, created_at
        ) VALUES (?, ?, ?, ?, ?, 'Pending', ?, ?)
        "#,
    )
    .bind(cluster_id.to_string())
    .bind(session_id.to_string())
    .bind(suggested_name)
    .bind(suggested_name_en)
    .bind(description)
    .bind(pass)
    .bind(created_at.to_rfc3339())
    .execute(conn)
    .await?;

    Ok(cluster_id)
}

/// Reassign documents to a cluster (clustering pass)
pub async fn assign_documents(
    conn: &mut SqliteConnection,
    cluster_id: Uuid,
    document_ids: &[Uuid],
) -> Result<()> {
    if document_ids.is_empty() {
        return Ok(());
    }

    let placeholders = vec!["?"; document_ids.len()].join(", ");
    let sql = format!(
        "UPDATE documents SET cluster_id = ? WHERE guid IN ({})",
        placeholders
    );
    let mut query = sqlx::query(&sql).bind(cluster_id.to_string());
    for document_id in document_ids {
        query = query.bind(document_id.to_string());
    }
    query.execute(conn).await?;

    Ok(())
}

/// Retire live clusters emptied by a clustering pass
pub async fn supersede_empty_clusters(
    conn: &mut SqliteConnection,
    session_id: Uuid,
    superseded_at: DateTime<Utc>,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE clusters SET superseded_at = ?
        WHERE session_id = ? AND superseded_at IS NULL
          AND (SELECT COUNT(*) FROM documents WHERE documents.cluster_id = clusters.guid) = 0
        "#,
    )
    .bind(superseded_at.to_rfc3339())
    .bind(session_id.to_string())
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Recompute the persisted validation counters from member documents
///
/// Runs inside the caller's transaction so counters can never be observed
/// stale relative to a document mutation.
pub async fn recompute_counts(conn: &mut SqliteConnection, cluster_id: Uuid) -> Result<()> {
    let id = cluster_id.to_string();

    sqlx::query(
        r#"
        UPDATE clusters SET
            doc_count = (SELECT COUNT(*) FROM documents WHERE cluster_id = ?),
            count_accepted = (SELECT COUNT(*) FROM documents
                              WHERE cluster_id = ? AND validation_status = 'Accepted'),
            count_deleted = (SELECT COUNT(*) FROM documents
                             WHERE cluster_id = ? AND validation_status = 'Deleted'),
            count_reclassified = (SELECT COUNT(*) FROM documents
                                  WHERE cluster_id = ? AND validation_status = 'Reclassified'),
            count_pending = (SELECT COUNT(*) FROM documents
                             WHERE cluster_id = ? AND validation_status = 'Pending')
        WHERE guid = ?
        "#,
    )
    .bind(&id)
    .bind(&id)
    .bind(&id)
    .bind(&id)
    .bind(&id)
    .bind(&id)
    .execute(conn)
    .await?;

    Ok(())
}

pub(crate) fn cluster_from_row(row: &SqliteRow) -> Result<Cluster> {
    let status: String = row.get("status");

    Ok(Cluster {
        id: parse_uuid(row.get("guid"))?,
        session_id: parse_uuid(row.get("session_id"))?,
        suggested_name: row.get("suggested_name"),
        suggested_name_en: row.get("suggested_name_en"),
        description: row.get("description"),
        status: ClusterStatus::parse(&status)?,
        approved_name: row.get("approved_name"),
        validated_by: row.get("validated_by"),
        validated_at: parse_optional_timestamp(row.get("validated_at"))?,
        validator_name: row.get("validator_name"),
        document_count: row.get("doc_count"),
        validation_counts: ValidationCounts {
            accepted: row.get("count_accepted"),
            deleted: row.get("count_deleted"),
            reclassified: row.get("count_reclassified"),
            pending: row.get("count_pending"),
        },
        clustering_pass: row.get("clustering_pass"),
        superseded_at: parse_optional_timestamp(row.get("superseded_at"))?,
        created_at: parse_timestamp(row.get("created_at"))?,
    })
}
