//! CLI command implementations.

pub mod clean;
pub mod plan;
pub mod run;

use anyhow::{Context, Result};
use rgw_qe_session::SuiteConfig;
use rgw_qe_types::TaskSpec;
use std::path::Path;

/// Load the suite configuration, or the defaults when no file is given.
pub fn load_suite(path: Option<&Path>) -> Result<SuiteConfig> {
    match path {
        Some(path) => Ok(SuiteConfig::from_file(path)?),
        None => Ok(SuiteConfig::default()),
    }
}

/// Read and validate a task file.
pub async fn load_task(path: &Path) -> Result<TaskSpec> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read task file {}", path.display()))?;
    TaskSpec::from_yaml_str(&text)
        .with_context(|| format!("Invalid task file {}", path.display()))
}
