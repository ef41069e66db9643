//! Cluster review service: approve / reject / delete and merge

use docket_common::{Error, Result};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::clusters;
use crate::models::{Cluster, ClusterAction};

/// Default actor when the caller supplies no reviewer identity
const DEFAULT_VALIDATOR: &str = "system";

/// Apply a review action to a Pending cluster
pub async fn apply_cluster_action(
    pool: &SqlitePool,
    cluster_id: Uuid,
    action: ClusterAction,
    approved_name: Option<String>,
    validated_by: Option<String>,
    validator_name: Option<String>,
) -> Result<Cluster> {
    let validated_by = validated_by.unwrap_or_else(|| DEFAULT_VALIDATOR.to_string());
    let validator_name = validator_name.unwrap_or_else(|| validated_by.clone());

    let cluster = clusters::apply_action(
        pool,
        cluster_id,
        action,
        approved_name,
        &validated_by,
        &validator_name,
    )
    .await?;

    tracing::info!(
        cluster_id = %cluster_id,
        action = ?action,
        status = cluster.status.as_str(),
        validated_by = %validated_by,
        "Cluster review action applied"
    );

    Ok(cluster)
}

/// Merge ≥2 clusters into one new cluster with the given name
pub async fn merge_clusters(
    pool: &SqlitePool,
    session_id: Uuid,
    cluster_ids: &[Uuid],
    new_name: &str,
) -> Result<Cluster> {
    let mut distinct = cluster_ids.to_vec();
    distinct.sort();
    distinct.dedup();

    if distinct.len() < 2 {
        return Err(Error::InvalidInput(
            "Merge requires at least 2 distinct cluster ids".to_string(),
        ));
    }
    let new_name = new_name.trim();
    if new_name.is_empty() {
        return Err(Error::InvalidInput(
            "Merge requires a non-empty name".to_string(),
        ));
    }

    let merged = clusters::merge_clusters(pool, session_id, &distinct, new_name).await?;

    tracing::info!(
        session_id = %session_id,
        sources = distinct.len(),
        merged_id = %merged.id,
        document_count = merged.document_count,
        "Clusters merged"
    );

    Ok(merged)
}
