//! Session store

use chrono::{DateTime, Utc};
use docket_common::{Error, Result};
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::models::Session;

/// Create a new import session
pub async fn create_session(pool: &SqlitePool, name: Option<String>) -> Result<Session> {
    let session = Session {
        id: Uuid::new_v4(),
        name,
        clustering_pass: 0,
        last_clustered_at: None,
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO sessions (guid, name, clustering_pass, last_clustered_at, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(session.id.to_string())
    .bind(&session.name)
    .bind(session.clustering_pass)
    .bind(Option::<String>::None)
    .bind(session.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(session)
}

/// Load a session by id
pub async fn load_session(pool: &SqlitePool, session_id: Uuid) -> Result<Option<Session>> {
    let row = sqlx::query(
        "SELECT guid, name, clustering_pass, last_clustered_at, created_at
         FROM sessions WHERE guid = ?",
    )
    .bind(session_id.to_string())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(Session {
            id: session_id,
            name: row.get("name"),
            clustering_pass: row.get("clustering_pass"),
            last_clustered_at: parse_optional_timestamp(row.get("last_clustered_at"))?,
            created_at: parse_timestamp(row.get("created_at"))?,
        })),
        None => Ok(None),
    }
}

/// Load a session, failing with NotFound when absent
pub async fn require_session(pool: &SqlitePool, session_id: Uuid) -> Result<Session> {
    load_session(pool, session_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Session not found: {}", session_id)))
}

/// Record a completed clustering pass (runs inside the pass transaction)
pub async fn mark_pass_completed(
    conn: &mut SqliteConnection,
    session_id: Uuid,
    pass: i64,
    completed_at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        "UPDATE sessions SET clustering_pass = ?, last_clustered_at = ? WHERE guid = ?",
    )
    .bind(pass)
    .bind(completed_at.to_rfc3339())
    .bind(session_id.to_string())
    .execute(conn)
    .await?;

    Ok(())
}

pub(crate) fn parse_timestamp(value: String) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Failed to parse timestamp: {}", e)))
}

pub(crate) fn parse_optional_timestamp(value: Option<String>) -> Result<Option<DateTime<Utc>>> {
    value.map(parse_timestamp).transpose()
}

pub(crate) fn parse_uuid(value: String) -> Result<Uuid> {
    Uuid::parse_str(&value).map_err(|e| Error::Internal(format!("Failed to parse UUID: {}", e)))
}
