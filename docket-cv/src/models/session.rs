//! Import session scoping documents, clusters, and re-cluster jobs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An import session
///
/// Every store and coordinator call is scoped by an explicit session id;
/// there is no ambient request context.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    pub name: Option<String>,
    /// Completed clustering passes (0 before the first pass)
    pub clustering_pass: i64,
    pub last_clustered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
