//! Service configuration for docket-cv
//!
//! Settings come from the Docket TOML config file with compiled defaults;
//! the root folder itself resolves separately (CLI → env → TOML → default)
//! via docket-common.

use std::path::Path;

use docket_common::{config::locate_config_file, Error, Result};
use serde::Deserialize;

/// docket-cv settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub recluster: ReclusterSettings,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Re-cluster coordinator settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReclusterSettings {
    /// Minimum accumulated validation changes before canTrigger turns true
    pub min_eligible: i64,
    /// Watchdog bound on pass duration (seconds)
    pub max_job_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            recluster: ReclusterSettings::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5730,
        }
    }
}

impl Default for ReclusterSettings {
    fn default() -> Self {
        Self {
            min_eligible: 1,
            max_job_secs: 600,
        }
    }
}

impl ServiceConfig {
    /// Load settings from an explicit path, the platform config file, or
    /// compiled defaults when no file exists
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = match explicit_path {
            Some(path) => Some(path.to_path_buf()),
            None => locate_config_file().ok(),
        };

        match path {
            Some(path) => {
                let content = std::fs::read_to_string(&path)?;
                let config: ServiceConfig = toml::from_str(&content).map_err(|e| {
                    Error::Config(format!("Failed to parse {}: {}", path.display(), e))
                })?;
                tracing::info!("Loaded configuration from {}", path.display());
                Ok(config)
            }
            None => {
                tracing::info!("No config file found, using defaults");
                Ok(ServiceConfig::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = ServiceConfig::default();
        assert_eq!(config.server.port, 5730);
        assert_eq!(config.recluster.min_eligible, 1);
        assert_eq!(config.recluster.max_job_secs, 600);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: ServiceConfig = toml::from_str(
            r#"
            [recluster]
            min_eligible = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.recluster.min_eligible, 5);
        assert_eq!(config.recluster.max_job_secs, 600);
        assert_eq!(config.server.host, "127.0.0.1");
    }
}
