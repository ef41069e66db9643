//! Re-cluster job state machine and polling snapshot
//!
//! The coordinator owns one job slot per session; pollers see an immutable
//! snapshot. Wire strings are lowercase per the client contract.

use serde::{Deserialize, Serialize};

/// Re-cluster job state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// No job has run (or eligibility has reset)
    Idle,
    /// A pass is executing; progress is present
    Processing,
    /// Last pass finished successfully
    Completed,
    /// Last pass failed; message carries the reason
    Error,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Error)
    }
}

/// Progress of a processing pass
///
/// `current` is monotonically non-decreasing up to `total`; `message` is an
/// optional human-readable phase label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobProgress {
    pub current: usize,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Poll snapshot returned by GET /recluster
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReclusterStatus {
    pub status: JobState,
    pub can_trigger: bool,
    /// Present only while status == processing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<JobProgress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
