//! docket-cv (Cluster Validation) - Legacy-import review service
//!
//! HTTP API for validating triaged documents, reviewing suggested clusters,
//! and coordinating asynchronous re-clustering passes.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use docket_common::config::{database_path, resolve_root_folder};
use docket_common::db::init_database;
use docket_cv::config::ServiceConfig;
use docket_cv::recluster::KeywordGroupingEngine;
use docket_cv::{build_router, AppState, ReclusterConfig, ReclusterCoordinator};

#[derive(Debug, Parser)]
#[command(name = "docket-cv", about = "Docket cluster validation service")]
struct Args {
    /// Root folder holding docket.db (overrides DOCKET_ROOT_FOLDER and config)
    #[arg(long)]
    root_folder: Option<String>,

    /// Explicit config file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listener port (overrides config)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting Docket Cluster Validation (docket-cv) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let config = ServiceConfig::load(args.config.as_deref())?;

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), "DOCKET_ROOT_FOLDER")?;
    let db_path = database_path(&root_folder);
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path).await?;
    info!("✓ Database ready");

    let coordinator = ReclusterCoordinator::new(
        pool.clone(),
        Arc::new(KeywordGroupingEngine),
        ReclusterConfig {
            min_eligible: config.recluster.min_eligible,
            max_job_secs: config.recluster.max_job_secs,
        },
    );

    let state = AppState::new(pool, Arc::new(coordinator));
    let app = build_router(state);

    let port = args.port.unwrap_or(config.server.port);
    let addr = format!("{}:{}", config.server.host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("docket-cv listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
