//! Shared library for the Docket cluster-validation services
//!
//! Provides the common error taxonomy, configuration resolution, and
//! database initialization used by every Docket module.

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
