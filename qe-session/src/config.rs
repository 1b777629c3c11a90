//! Suite configuration for rgw-qe sessions.
//!
//! Loaded from a TOML file; every key is optional. The resulting
//! [`SuiteConfig`] is immutable and injected into the orchestrator.

use rgw_qe_types::ScriptLayouts;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Fixed parameters shared by every session.
#[derive(Debug, Clone, Deserialize)]
pub struct SuiteConfig {
    /// Test-script repository cloned into each workspace.
    #[serde(default = "default_repo_url")]
    pub repo_url: String,
    /// Directory name the clone lands in.
    #[serde(default = "default_repo_name")]
    pub repo_name: String,
    /// Branch to check out.
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Version → (script dir, config dir) table.
    #[serde(default)]
    pub layouts: ScriptLayouts,
    /// Backing service checked before the test runs.
    #[serde(default = "default_service")]
    pub service: String,
    /// Settle window before the readiness query, in seconds.
    #[serde(default = "default_settle_secs")]
    pub settle_before_secs: u64,
    /// Settle window after the readiness query, in seconds.
    #[serde(default = "default_settle_secs")]
    pub settle_after_secs: u64,
    /// Python packages installed into the workspace venv.
    #[serde(default = "default_packages")]
    pub packages: Vec<String>,
    /// Local directory for temporary config artifacts.
    #[serde(default = "default_local_tmp_dir")]
    pub local_tmp_dir: PathBuf,
    /// SSH connect timeout, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

// Default value functions
fn default_repo_url() -> String {
    "https://github.com/red-hat-storage/ceph-qe-scripts.git".to_string()
}

fn default_repo_name() -> String {
    "ceph-qe-scripts".to_string()
}

fn default_branch() -> String {
    "master".to_string()
}

fn default_service() -> String {
    "ceph-radosgw.target".to_string()
}

fn default_settle_secs() -> u64 {
    60
}

fn default_packages() -> Vec<String> {
    ["boto", "boto3", "names", "PyYaml", "ConfigParser"]
        .iter()
        .map(|p| p.to_string())
        .collect()
}

fn default_local_tmp_dir() -> PathBuf {
    PathBuf::from("/tmp")
}

fn default_connect_timeout_secs() -> u64 {
    30
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            repo_url: default_repo_url(),
            repo_name: default_repo_name(),
            branch: default_branch(),
            layouts: ScriptLayouts::default(),
            service: default_service(),
            settle_before_secs: default_settle_secs(),
            settle_after_secs: default_settle_secs(),
            packages: default_packages(),
            local_tmp_dir: default_local_tmp_dir(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl SuiteConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, SuiteConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| SuiteConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| SuiteConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Settle window before the readiness query.
    pub fn settle_before(&self) -> Duration {
        Duration::from_secs(self.settle_before_secs)
    }

    /// Settle window after the readiness query.
    pub fn settle_after(&self) -> Duration {
        Duration::from_secs(self.settle_after_secs)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum SuiteConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
}
