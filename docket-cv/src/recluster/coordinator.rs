//! Re-cluster job coordinator
//!
//! Owns one job slot per session. `trigger` is the only state-changing entry
//! point: it performs an atomic check-and-set on the slot (two rapid clicks
//! or two browser tabs must not both start a pass) and spawns the job on a
//! background task. `get_status` is a pure read safe to poll indefinitely.
//!
//! All store writes happen in a single transaction at the end of a pass, so
//! an engine failure or watchdog timeout leaves documents and clusters
//! exactly as they were before the trigger.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use docket_common::{Error, Result};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::{clusters, documents, sessions};
use crate::models::{JobProgress, JobState, ReclusterStatus, ValidationStatus};

use super::engine::{ClusterableDocument, ClusteringEngine};

/// Coordinator settings
#[derive(Debug, Clone)]
pub struct ReclusterConfig {
    /// Minimum accumulated eligible documents before canTrigger turns true
    pub min_eligible: i64,
    /// Watchdog: maximum pass duration before processing transitions to
    /// error (prevents permanent mutual-exclusion lockout)
    pub max_job_secs: u64,
}

impl Default for ReclusterConfig {
    fn default() -> Self {
        Self {
            min_eligible: 1,
            max_job_secs: 600,
        }
    }
}

/// Per-session job state; pollers read snapshots of this
#[derive(Debug, Clone)]
struct JobSlot {
    state: JobState,
    progress: Option<JobProgress>,
    message: Option<String>,
}

impl JobSlot {
    fn idle() -> Self {
        Self {
            state: JobState::Idle,
            progress: None,
            message: None,
        }
    }
}

/// Coordinates re-clustering passes across sessions
pub struct ReclusterCoordinator {
    db: SqlitePool,
    engine: Arc<dyn ClusteringEngine>,
    config: ReclusterConfig,
    slots: Mutex<HashMap<Uuid, Arc<Mutex<JobSlot>>>>,
}

impl ReclusterCoordinator {
    pub fn new(db: SqlitePool, engine: Arc<dyn ClusteringEngine>, config: ReclusterConfig) -> Self {
        Self {
            db,
            engine,
            config,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Poll snapshot for a session
    ///
    /// Side-effect-free; repeated calls with no intervening mutation return
    /// identical payloads. A terminal outcome (completed/error) is reported
    /// until the next trigger; canTrigger is always recomputed live.
    pub async fn get_status(&self, session_id: Uuid) -> Result<ReclusterStatus> {
        sessions::require_session(&self.db, session_id).await?;

        let slot = self.slot(session_id);
        let snapshot = slot.lock().expect("job slot poisoned").clone();

        let eligible = documents::count_recluster_eligible(&self.db, session_id).await?;
        let can_trigger =
            snapshot.state != JobState::Processing && eligible >= self.config.min_eligible;

        Ok(ReclusterStatus {
            status: snapshot.state,
            can_trigger,
            progress: (snapshot.state == JobState::Processing)
                .then_some(snapshot.progress)
                .flatten(),
            message: snapshot.message,
        })
    }

    /// Start a re-clustering pass for a session
    ///
    /// Fails with Conflict when a pass is already processing and with
    /// InvalidState when there is nothing eligible to re-cluster. On success
    /// the slot reads `processing` before this returns, so an immediately
    /// following get_status observes the running job.
    pub async fn trigger(&self, session_id: Uuid) -> Result<()> {
        let session = sessions::require_session(&self.db, session_id).await?;

        let eligible = documents::count_recluster_eligible(&self.db, session_id).await?;
        if eligible < self.config.min_eligible {
            return Err(Error::InvalidState(format!(
                "No eligible validation changes to re-cluster (have {}, need {})",
                eligible, self.config.min_eligible
            )));
        }

        let slot = self.slot(session_id);
        {
            // Check-and-set: the loser of a concurrent trigger race sees
            // Processing here and gets Conflict
            let mut guard = slot.lock().expect("job slot poisoned");
            if guard.state == JobState::Processing {
                return Err(Error::Conflict(format!(
                    "Re-cluster job already processing for session {}",
                    session_id
                )));
            }
            guard.state = JobState::Processing;
            guard.progress = Some(JobProgress {
                current: 0,
                total: 0,
                message: Some("Preparing".to_string()),
            });
            guard.message = None;
        }

        tracing::info!(
            session_id = %session_id,
            pass = session.clustering_pass + 1,
            eligible = eligible,
            "Re-cluster job triggered"
        );

        let db = self.db.clone();
        let engine = self.engine.clone();
        let max_duration = Duration::from_secs(self.config.max_job_secs);
        let job_slot = slot.clone();
        tokio::spawn(async move {
            run_job(db, engine, session_id, job_slot, max_duration).await;
        });

        Ok(())
    }

    fn slot(&self, session_id: Uuid) -> Arc<Mutex<JobSlot>> {
        let mut slots = self.slots.lock().expect("slot map poisoned");
        slots
            .entry(session_id)
            .or_insert_with(|| Arc::new(Mutex::new(JobSlot::idle())))
            .clone()
    }
}

/// Execute one pass under the watchdog and record the outcome in the slot
async fn run_job(
    db: SqlitePool,
    engine: Arc<dyn ClusteringEngine>,
    session_id: Uuid,
    slot: Arc<Mutex<JobSlot>>,
    max_duration: Duration,
) {
    let outcome = tokio::time::timeout(
        max_duration,
        execute_pass(db, engine, session_id, slot.clone()),
    )
    .await;

    let mut guard = slot.lock().expect("job slot poisoned");
    guard.progress = None;
    match outcome {
        Ok(Ok(summary)) => {
            guard.state = JobState::Completed;
            guard.message = Some(format!(
                "Re-clustering completed: {} clusters from {} documents",
                summary.clusters_created, summary.documents_clustered
            ));
            tracing::info!(
                session_id = %session_id,
                clusters = summary.clusters_created,
                documents = summary.documents_clustered,
                "Re-cluster job completed"
            );
        }
        Ok(Err(e)) => {
            guard.state = JobState::Error;
            guard.message = Some(e.to_string());
            tracing::error!(session_id = %session_id, error = %e, "Re-cluster job failed");
        }
        Err(_elapsed) => {
            guard.state = JobState::Error;
            guard.message = Some(format!(
                "Re-cluster job timed out after {}s",
                max_duration.as_secs()
            ));
            tracing::error!(
                session_id = %session_id,
                timeout_secs = max_duration.as_secs(),
                "Re-cluster job watchdog fired"
            );
        }
    }
}

struct PassSummary {
    clusters_created: usize,
    documents_clustered: usize,
}

/// One re-clustering pass
///
/// Phases: load eligible documents, run the engine on a blocking worker,
/// then apply everything in a single transaction (new clusters, document
/// reassignment, counter recomputation, eligibility reset, pass bump).
async fn execute_pass(
    db: SqlitePool,
    engine: Arc<dyn ClusteringEngine>,
    session_id: Uuid,
    slot: Arc<Mutex<JobSlot>>,
) -> Result<PassSummary> {
    set_progress(&slot, 0, 0, "Loading documents");

    let eligible = documents::load_recluster_eligible(&db, session_id).await?;
    let eligible_ids: Vec<Uuid> = eligible.iter().map(|d| d.id).collect();

    // Deleted documents drop out of clustering entirely
    let (deleted, clusterable): (Vec<_>, Vec<_>) = eligible
        .into_iter()
        .partition(|d| d.validation_status == ValidationStatus::Deleted);
    let deleted_ids: Vec<Uuid> = deleted.iter().map(|d| d.id).collect();

    let inputs: Vec<ClusterableDocument> = clusterable
        .iter()
        .map(|d| ClusterableDocument {
            id: d.id,
            file_name: d.file_name.clone(),
            file_extension: d.file_extension.clone(),
            email_subject: d.email_subject.clone(),
            triage_status: d.triage_status,
        })
        .collect();

    let input_count = inputs.len();
    set_progress(&slot, 0, input_count, "Clustering documents");

    let progress_slot = slot.clone();
    let proposals = tokio::task::spawn_blocking(move || {
        engine.cluster(&inputs, &move |current, total, message| {
            set_progress(&progress_slot, current, total, message);
        })
    })
    .await
    .map_err(|e| Error::Internal(format!("Clustering task panicked: {}", e)))??;

    // Keep current at total so pollers never observe a decrease
    set_progress(&slot, input_count, input_count, "Writing cluster assignments");

    let mut tx = db.begin().await?;

    let pass: i64 = sqlx::query_scalar("SELECT clustering_pass FROM sessions WHERE guid = ?")
        .bind(session_id.to_string())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Session not found: {}", session_id)))?;
    let new_pass = pass + 1;

    // Clusters that are about to lose members need their counters refreshed
    let prior_clusters = documents::clusters_of_documents(&mut *tx, &eligible_ids).await?;

    let now = Utc::now();
    let mut documents_clustered = 0;
    let mut new_cluster_ids = Vec::new();
    for proposal in &proposals {
        let cluster_id = clusters::insert_cluster(
            &mut *tx,
            session_id,
            new_pass,
            &proposal.suggested_name,
            proposal.suggested_name_en.as_deref(),
            proposal.description.clone(),
            now,
        )
        .await?;
        clusters::assign_documents(&mut *tx, cluster_id, &proposal.document_ids).await?;
        documents_clustered += proposal.document_ids.len();
        new_cluster_ids.push(cluster_id);
    }

    documents::unassign_documents(&mut *tx, &deleted_ids).await?;

    for cluster_id in prior_clusters.iter().chain(new_cluster_ids.iter()) {
        clusters::recompute_counts(&mut *tx, *cluster_id).await?;
    }

    clusters::supersede_empty_clusters(&mut *tx, session_id, now).await?;
    documents::clear_recluster_flags(&mut *tx, session_id).await?;
    sessions::mark_pass_completed(&mut *tx, session_id, new_pass, now).await?;

    tx.commit().await?;

    Ok(PassSummary {
        clusters_created: proposals.len(),
        documents_clustered,
    })
}

/// Update slot progress while processing; current never decreases
fn set_progress(slot: &Arc<Mutex<JobSlot>>, current: usize, total: usize, message: &str) {
    let mut guard = slot.lock().expect("job slot poisoned");
    if guard.state != JobState::Processing {
        return;
    }

    let floor = match &guard.progress {
        Some(p) if p.total == total => p.current,
        _ => 0,
    };
    guard.progress = Some(JobProgress {
        current: current.max(floor),
        total,
        message: Some(message.to_string()),
    });
}
