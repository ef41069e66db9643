//! docket-cv library - Cluster Validation module
//!
//! Coordinates human review of triaged legacy documents: per-document
//! validation, cluster approval/merge, and asynchronous re-clustering
//! passes polled over HTTP.

use std::sync::Arc;

use axum::Router;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod pagination;
pub mod recluster;
pub mod services;

pub use crate::error::{ApiError, ApiResult};
pub use crate::recluster::{ReclusterConfig, ReclusterCoordinator};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Re-cluster job coordinator (one job slot per session)
    pub recluster: Arc<ReclusterCoordinator>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, recluster: Arc<ReclusterCoordinator>) -> Self {
        Self { db, recluster }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::session_routes())
        .merge(api::cluster_routes())
        .merge(api::document_routes())
        .merge(api::uncertain_routes())
        .merge(api::recluster_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
