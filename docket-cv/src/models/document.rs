//! Document model and validation state machine
//!
//! A document's triage classification comes from the external classifier at
//! ingestion and never changes here. Its validation status transitions only
//! via explicit reviewer action (accept / delete / reclassify). Documents are
//! never physically deleted: 'Deleted' is a status, not row removal.

use chrono::{DateTime, Utc};
use docket_common::{Error, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Triage classification assigned by the external classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriageStatus {
    FirmDrafted,
    ThirdParty,
    Irrelevant,
    CourtDoc,
    Uncertain,
}

impl TriageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriageStatus::FirmDrafted => "FirmDrafted",
            TriageStatus::ThirdParty => "ThirdParty",
            TriageStatus::Irrelevant => "Irrelevant",
            TriageStatus::CourtDoc => "CourtDoc",
            TriageStatus::Uncertain => "Uncertain",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "FirmDrafted" => Ok(TriageStatus::FirmDrafted),
            "ThirdParty" => Ok(TriageStatus::ThirdParty),
            "Irrelevant" => Ok(TriageStatus::Irrelevant),
            "CourtDoc" => Ok(TriageStatus::CourtDoc),
            "Uncertain" => Ok(TriageStatus::Uncertain),
            other => Err(Error::InvalidInput(format!(
                "Unknown triage status: {}",
                other
            ))),
        }
    }
}

/// Reviewer validation status, independent of triage status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationStatus {
    Pending,
    Accepted,
    Deleted,
    Reclassified,
}

impl ValidationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::Pending => "Pending",
            ValidationStatus::Accepted => "Accepted",
            ValidationStatus::Deleted => "Deleted",
            ValidationStatus::Reclassified => "Reclassified",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "Pending" => Ok(ValidationStatus::Pending),
            "Accepted" => Ok(ValidationStatus::Accepted),
            "Deleted" => Ok(ValidationStatus::Deleted),
            "Reclassified" => Ok(ValidationStatus::Reclassified),
            other => Err(Error::InvalidInput(format!(
                "Unknown validation status: {}",
                other
            ))),
        }
    }
}

/// Reviewer action on a single document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentAction {
    Accept,
    Delete,
    Reclassify,
}

impl DocumentAction {
    /// Resulting validation status for this action
    pub fn target_status(&self) -> ValidationStatus {
        match self {
            DocumentAction::Accept => ValidationStatus::Accepted,
            DocumentAction::Delete => ValidationStatus::Deleted,
            DocumentAction::Reclassify => ValidationStatus::Reclassified,
        }
    }

    /// Validate the reclassification note for this action
    ///
    /// `reclassify` requires a non-empty note; accept/delete must not carry
    /// one forward (any previous note is cleared).
    pub fn validate_note(&self, note: Option<&str>) -> Result<Option<String>> {
        match self {
            DocumentAction::Reclassify => {
                let note = note.map(str::trim).unwrap_or("");
                if note.is_empty() {
                    Err(Error::InvalidInput(
                        "Reclassification requires a non-empty note".to_string(),
                    ))
                } else {
                    Ok(Some(note.to_string()))
                }
            }
            DocumentAction::Accept | DocumentAction::Delete => Ok(None),
        }
    }
}

/// A triaged legacy document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub session_id: Uuid,
    /// Owning cluster; null before the first clustering pass
    pub cluster_id: Option<Uuid>,
    pub file_name: String,
    pub file_extension: Option<String>,
    pub text_preview: Option<String>,
    pub email_subject: Option<String>,
    pub email_sender: Option<String>,
    pub email_date: Option<DateTime<Utc>>,
    pub triage_status: Option<TriageStatus>,
    pub triage_confidence: Option<f64>,
    pub triage_reason: Option<String>,
    pub validation_status: ValidationStatus,
    /// Present iff validation_status == Reclassified
    pub reclassification_note: Option<String>,
    pub validated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
