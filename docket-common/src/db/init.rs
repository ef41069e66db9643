//! Database initialization
//!
//! Creates the SQLite database on first run and brings the schema up to
//! date. Schema creation is idempotent; every module calls `init_database`
//! at startup.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(20)
        .min_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    configure_pragmas(&pool).await?;
    create_schema(&pool).await?;

    Ok(pool)
}

/// Initialize an in-memory database (tests and ephemeral runs)
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    configure_pragmas(&pool).await?;
    create_schema(&pool).await?;

    Ok(pool)
}

async fn configure_pragmas(pool: &SqlitePool) -> Result<()> {
    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    // WAL allows concurrent readers with one writer; the validation UI reads
    // while a re-clustering pass commits
    sqlx::query("PRAGMA journal_mode = WAL").execute(pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(pool).await?;

    Ok(())
}

/// Create all tables (idempotent - safe to call multiple times)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_sessions_table(pool).await?;
    create_clusters_table(pool).await?;
    create_documents_table(pool).await?;
    Ok(())
}

/// Import sessions scoping documents, clusters, and re-cluster jobs
async fn create_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            guid TEXT PRIMARY KEY,
            name TEXT,
            clustering_pass INTEGER NOT NULL DEFAULT 0,
            last_clustered_at TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Clusters produced by clustering passes and merges
///
/// Validation counters are persisted (not computed on read) so they can be
/// recomputed inside the same transaction as any member-document mutation;
/// they must always sum to doc_count.
async fn create_clusters_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS clusters (
            guid TEXT PRIMARY KEY,
            session_id TEXT NOT NULL REFERENCES sessions(guid),
            suggested_name TEXT NOT NULL,
            suggested_name_en TEXT,
            description TEXT,
            status TEXT NOT NULL DEFAULT 'Pending',
            approved_name TEXT,
            validated_by TEXT,
            validated_at TEXT,
            validator_name TEXT,
            doc_count INTEGER NOT NULL DEFAULT 0,
            count_accepted INTEGER NOT NULL DEFAULT 0,
            count_deleted INTEGER NOT NULL DEFAULT 0,
            count_reclassified INTEGER NOT NULL DEFAULT 0,
            count_pending INTEGER NOT NULL DEFAULT 0,
            clustering_pass INTEGER NOT NULL DEFAULT 1,
            superseded_at TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_clusters_session ON clusters(session_id, superseded_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Triaged documents
///
/// Documents are never physically deleted; 'Deleted' is a validation status.
/// recluster_eligible marks validation changes accumulated since the last
/// clustering pass (and newly ingested, never-clustered documents).
async fn create_documents_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            guid TEXT PRIMARY KEY,
            session_id TEXT NOT NULL REFERENCES sessions(guid),
            cluster_id TEXT REFERENCES clusters(guid),
            file_name TEXT NOT NULL,
            file_extension TEXT,
            text_preview TEXT,
            email_subject TEXT,
            email_sender TEXT,
            email_date TEXT,
            triage_status TEXT,
            triage_confidence REAL,
            triage_reason TEXT,
            validation_status TEXT NOT NULL DEFAULT 'Pending',
            reclassification_note TEXT,
            validated_at TEXT,
            recluster_eligible INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_session ON documents(session_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_cluster ON documents(cluster_id)")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_documents_triage ON documents(session_id, triage_status)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
