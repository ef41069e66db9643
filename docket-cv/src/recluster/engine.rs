//! Clustering engine seam
//!
//! The production clustering capability (embedding-based) is external to
//! this service; only its progress and completion contract matters here.
//! `KeywordGroupingEngine` is the bundled implementation used by local runs
//! and tests: a deterministic lexical grouper over triage category and
//! normalized document titles.

use docket_common::Result;
use uuid::Uuid;

use crate::models::TriageStatus;

/// Input to a clustering pass
#[derive(Debug, Clone)]
pub struct ClusterableDocument {
    pub id: Uuid,
    pub file_name: String,
    pub file_extension: Option<String>,
    pub email_subject: Option<String>,
    pub triage_status: Option<TriageStatus>,
}

/// A cluster produced by a pass
#[derive(Debug, Clone)]
pub struct ClusterProposal {
    pub suggested_name: String,
    pub suggested_name_en: Option<String>,
    pub description: Option<String>,
    pub document_ids: Vec<Uuid>,
}

/// Progress callback: (current, total, phase label)
///
/// `current` must be monotonically non-decreasing up to `total`.
pub type ProgressFn = dyn Fn(usize, usize, &str) + Send + Sync;

/// A clustering algorithm invoked by the job coordinator
///
/// Implementations run on a blocking worker thread; they must be pure with
/// respect to the stores (the coordinator applies the proposals in a single
/// transaction after the engine returns).
pub trait ClusteringEngine: Send + Sync {
    fn cluster(
        &self,
        documents: &[ClusterableDocument],
        progress: &ProgressFn,
    ) -> Result<Vec<ClusterProposal>>;
}

/// Deterministic lexical grouper: triage category + normalized title token
#[derive(Debug, Default)]
pub struct KeywordGroupingEngine;

impl ClusteringEngine for KeywordGroupingEngine {
    fn cluster(
        &self,
        documents: &[ClusterableDocument],
        progress: &ProgressFn,
    ) -> Result<Vec<ClusterProposal>> {
        let total = documents.len();
        progress(0, total, "Grouping documents");

        let mut groups: std::collections::BTreeMap<(String, String), Vec<Uuid>> =
            std::collections::BTreeMap::new();

        for (idx, doc) in documents.iter().enumerate() {
            let category = doc
                .triage_status
                .map(|s| s.as_str().to_string())
                .unwrap_or_else(|| "Untriaged".to_string());
            let key = group_key(doc);
            groups.entry((category, key)).or_default().push(doc.id);

            progress(idx + 1, total, "Grouping documents");
        }

        let proposals = groups
            .into_iter()
            .map(|((category, key), document_ids)| ClusterProposal {
                suggested_name: format!("{}: {}", category, key),
                suggested_name_en: None,
                description: Some(format!(
                    "{} documents grouped by shared title keywords",
                    document_ids.len()
                )),
                document_ids,
            })
            .collect();

        Ok(proposals)
    }
}

/// Normalize a document into its grouping key
///
/// Prefers the email subject (with reply/forward prefixes stripped) over the
/// file name stem; trailing version/date digits are dropped so revisions of
/// the same document group together.
fn group_key(doc: &ClusterableDocument) -> String {
    let raw = doc
        .email_subject
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(strip_reply_prefixes)
        .unwrap_or_else(|| file_stem(&doc.file_name));

    let normalized: String = raw
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let words: Vec<&str> = normalized
        .split_whitespace()
        .filter(|w| !is_version_token(w))
        .take(4)
        .collect();

    if words.is_empty() {
        "untitled".to_string()
    } else {
        words.join(" ")
    }
}

/// Numbers and `v<digits>` revision markers carry no grouping signal
fn is_version_token(word: &str) -> bool {
    if word.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    let mut chars = word.chars();
    matches!(chars.next(), Some('v'))
        && word.len() > 1
        && chars.all(|c| c.is_ascii_digit())
}

fn strip_reply_prefixes(subject: &str) -> String {
    let mut s = subject.trim();
    'outer: loop {
        let lower = s.to_lowercase();
        for prefix in ["re:", "fwd:", "fw:", "aw:"] {
            if lower.starts_with(prefix) {
                s = s[prefix.len()..].trim_start();
                continue 'outer;
            }
        }
        return s.to_string();
    }
}

fn file_stem(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem.to_string(),
        _ => file_name.to_string(),
    }
}
