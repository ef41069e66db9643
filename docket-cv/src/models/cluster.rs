//! Cluster model and review state machine
//!
//! Cluster status transitions are one-way terminal:
//!
//! ```text
//! Pending --approve--> Approved (terminal)
//! Pending --reject--> Rejected (terminal)
//! Pending --delete--> Deleted (terminal)
//! {any}   --merge (as a source)--> retired, superseded by new cluster
//! ```
//!
//! Nothing leaves a terminal state except merge (as a source) or a
//! re-clustering pass, both of which retire the cluster. Retired clusters
//! remain visible in history but are immutable.

use chrono::{DateTime, Utc};
use docket_common::{Error, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cluster review status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClusterStatus {
    Pending,
    Approved,
    Rejected,
    Deleted,
}

impl ClusterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterStatus::Pending => "Pending",
            ClusterStatus::Approved => "Approved",
            ClusterStatus::Rejected => "Rejected",
            ClusterStatus::Deleted => "Deleted",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "Pending" => Ok(ClusterStatus::Pending),
            "Approved" => Ok(ClusterStatus::Approved),
            "Rejected" => Ok(ClusterStatus::Rejected),
            "Deleted" => Ok(ClusterStatus::Deleted),
            other => Err(Error::InvalidInput(format!(
                "Unknown cluster status: {}",
                other
            ))),
        }
    }

    /// Approved/Rejected/Deleted are terminal
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ClusterStatus::Pending)
    }
}

/// Reviewer action on a cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterAction {
    Approve,
    Reject,
    Delete,
}

impl ClusterAction {
    /// Resulting status for this action
    pub fn target_status(&self) -> ClusterStatus {
        match self {
            ClusterAction::Approve => ClusterStatus::Approved,
            ClusterAction::Reject => ClusterStatus::Rejected,
            ClusterAction::Delete => ClusterStatus::Deleted,
        }
    }
}

/// Validate a review transition from `current` via `action`
///
/// Only Pending clusters accept review actions; a second action on an
/// already-terminal cluster fails and leaves state unchanged.
pub fn validate_transition(current: ClusterStatus, action: ClusterAction) -> Result<ClusterStatus> {
    if current.is_terminal() {
        return Err(Error::InvalidState(format!(
            "Cluster is already {} and cannot be {}d",
            current.as_str(),
            match action {
                ClusterAction::Approve => "approve",
                ClusterAction::Reject => "reject",
                ClusterAction::Delete => "delete",
            }
        )));
    }
    Ok(action.target_status())
}

/// Per-cluster aggregate of member-document validation statuses
///
/// Invariant: accepted + deleted + reclassified + pending == documentCount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationCounts {
    pub accepted: i64,
    pub deleted: i64,
    pub reclassified: i64,
    pub pending: i64,
}

impl ValidationCounts {
    pub fn sum(&self) -> i64 {
        self.accepted + self.deleted + self.reclassified + self.pending
    }
}

/// A document cluster suggested by a clustering pass (or created by merge)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub id: Uuid,
    pub session_id: Uuid,
    pub suggested_name: String,
    pub suggested_name_en: Option<String>,
    pub description: Option<String>,
    pub status: ClusterStatus,
    /// Set only on Approved; falls back to suggested_name
    pub approved_name: Option<String>,
    pub validated_by: Option<String>,
    pub validated_at: Option<DateTime<Utc>>,
    pub validator_name: Option<String>,
    pub document_count: i64,
    pub validation_counts: ValidationCounts,
    /// Clustering pass that created this cluster
    pub clustering_pass: i64,
    /// Set when retired by merge or a later clustering pass
    pub superseded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Aggregate stats over a session's live clusters
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStats {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub total_documents: i64,
}
