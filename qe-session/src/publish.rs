//! Config artifact publishing.
//!
//! The inline `config` payload of a task is wrapped as `{config: ...}`,
//! written to an exclusively created local temp file, copied into the cloned
//! repository on the node, and the local copy removed again. The remote copy
//! lives until workspace teardown.

use rgw_qe_remote::{Capture, RemoteCommand, RemoteExecutor, TargetNode};
use rgw_qe_types::TaskSpec;
use serde_yaml::{Mapping, Value};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::config::SuiteConfig;
use crate::error::{ProvisioningError, SetupStep};
use crate::workspace::Workspace;

/// Top-level key the payload is wrapped under.
pub const CONFIG_KEY: &str = "config";

/// Serialize a payload as block-style YAML under [`CONFIG_KEY`].
pub fn render_config(payload: &Value) -> Result<String, serde_yaml::Error> {
    let mut wrapped = Mapping::new();
    wrapped.insert(Value::from(CONFIG_KEY), payload.clone());
    serde_yaml::to_string(&Value::Mapping(wrapped))
}

/// File name prefix of a task's local config: `<test>.yaml_<pid><user>_`.
///
/// Process id and OS user keep concurrent invocations on one controller
/// apart; the temp file adds a random suffix and is created exclusively.
pub fn local_artifact_prefix(task: &TaskSpec) -> String {
    format!(
        "{}_{}{}_",
        task.config_file_name(),
        std::process::id(),
        local_user()
    )
}

fn write_local_artifact(
    dir: &Path,
    task: &TaskSpec,
    contents: &str,
) -> Result<NamedTempFile, ProvisioningError> {
    let artifact = tempfile::Builder::new()
        .prefix(&local_artifact_prefix(task))
        .tempfile_in(dir)
        .map_err(|e| ProvisioningError::LocalArtifact {
            path: dir.to_path_buf(),
            source: e,
        })?;
    artifact
        .as_file()
        .write_all(contents.as_bytes())
        .and_then(|()| artifact.as_file().flush())
        .map_err(|e| ProvisioningError::LocalArtifact {
            path: artifact.path().to_path_buf(),
            source: e,
        })?;
    Ok(artifact)
}

fn local_user() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("LOGNAME"))
        .unwrap_or_else(|_| "unknown".to_string());
    user.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .collect()
}

/// Publishes a task's config payload to a node.
pub struct ConfigPublisher<'a, E: ?Sized> {
    executor: &'a E,
    suite: &'a SuiteConfig,
}

impl<'a, E: RemoteExecutor + ?Sized> ConfigPublisher<'a, E> {
    /// Create a publisher.
    pub fn new(executor: &'a E, suite: &'a SuiteConfig) -> Self {
        Self { executor, suite }
    }

    /// Resolve the node's home directory via `echo $HOME`.
    pub async fn home_dir(&self, node: &TargetNode) -> Result<String, ProvisioningError> {
        let output = self
            .executor
            .execute_ok(node, &RemoteCommand::raw("echo $HOME"), Capture::Stdout)
            .await
            .map_err(|e| ProvisioningError::step(SetupStep::HomeDirLookup, &node.host, e))?;

        match output.stdout_trimmed() {
            Some(home) if !home.is_empty() => Ok(home.trim_end_matches('/').to_string()),
            _ => Err(ProvisioningError::EmptyHomeDir {
                host: node.host.clone(),
            }),
        }
    }

    /// Publish `payload` for `task` into `workspace` on `node`.
    ///
    /// Returns the absolute remote path of the config file. The local temp
    /// file is gone when this returns, whatever the outcome.
    pub async fn publish(
        &self,
        node: &TargetNode,
        task: &TaskSpec,
        payload: &Value,
        workspace: &Workspace,
    ) -> Result<String, ProvisioningError> {
        let rendered = render_config(payload)?;
        tracing::debug!("[{}] config artifact:\n{}", node.role, rendered);

        let artifact = write_local_artifact(&self.suite.local_tmp_dir, task, &rendered)?;

        let home = self.home_dir(node).await?;
        let remote_path = format!(
            "{}/{}/{}",
            home,
            workspace.repo(&self.suite.repo_name),
            task.config_path(&self.suite.layouts)
        );

        tracing::info!(
            "[{}] copying {} to {}",
            node.role,
            artifact.path().display(),
            remote_path
        );
        self.executor
            .transfer_file(artifact.path(), node, &remote_path)
            .await
            .map_err(|e| ProvisioningError::step(SetupStep::ConfigTransfer, &node.host, e))?;
        if let Err(e) = artifact.close() {
            tracing::warn!("[{}] failed to remove local config artifact: {}", node.role, e);
        }

        // Diagnostics only
        if let Some((dir, _)) = remote_path.rsplit_once('/') {
            self.log_remote(node, RemoteCommand::argv(["ls", "-lt", dir])).await;
        }
        self.log_remote(node, RemoteCommand::argv(["cat", remote_path.as_str()]))
            .await;

        Ok(remote_path)
    }

    async fn log_remote(&self, node: &TargetNode, command: RemoteCommand) {
        if let Ok(out) = self.executor.execute(node, &command, Capture::Stdout).await {
            tracing::debug!("[{}] {}:\n{}", node.role, command, out.stdout.unwrap_or_default());
        }
    }
}
