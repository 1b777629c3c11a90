//! Per-node workspace management.
//!
//! A workspace is a directory in the remote home named
//! `<test>_<timestamp>_<nonce>`, holding the venv, the cloned test
//! repository and the published config. Everything the payload may leave
//! behind is described by the leftover pattern set, swept before setup and
//! again at teardown.

use rgw_qe_remote::{Capture, RemoteCommand, RemoteExecutor, TargetNode};
use rgw_qe_types::{RunId, TestId};

use crate::error::{ProvisioningError, SetupStep};

/// Name of the venv directory inside a workspace.
pub const VENV_DIR: &str = "venv";

/// Artifact globs the payload leaves in the remote home, in sweep order.
/// The workspace and its venv are prepended per session.
pub const PAYLOAD_LEFTOVERS: [&str; 9] = [
    "io_info.yaml",
    "*.json",
    "Download.*",
    "Download",
    "*.mpFile",
    "x*",
    "key.*",
    "Mp.*",
    "*.key.*",
];

/// A workspace directory, relative to the remote home.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    name: String,
}

impl Workspace {
    /// Workspace for one run of `test`.
    pub fn for_run(test: &TestId, run: RunId) -> Self {
        Self {
            name: run.workspace_name(test),
        }
    }

    /// Glob matching every workspace of `test`, for sweeping stale runs.
    pub fn any_run(test: &TestId) -> Self {
        Self {
            name: format!("{test}_*"),
        }
    }

    /// Directory name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the venv.
    pub fn venv(&self) -> String {
        format!("{}/{}", self.name, VENV_DIR)
    }

    /// Path of the cloned repository.
    pub fn repo(&self, repo_name: &str) -> String {
        format!("{}/{}", self.name, repo_name)
    }

    /// The full leftover pattern set for this workspace.
    pub fn leftover_patterns(&self) -> Vec<String> {
        let mut patterns = vec![self.venv(), self.name.clone()];
        patterns.extend(PAYLOAD_LEFTOVERS.iter().map(|p| p.to_string()));
        patterns
    }
}

/// Outcome of a sweep over the leftover pattern set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Patterns a delete was attempted for.
    pub attempted: usize,
    /// Patterns whose delete command failed or could not run.
    pub failed: usize,
}

impl SweepReport {
    /// True if every delete succeeded.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Creates workspaces and sweeps leftovers on remote nodes.
pub struct WorkspaceManager<'a, E: ?Sized> {
    executor: &'a E,
}

impl<'a, E: RemoteExecutor + ?Sized> WorkspaceManager<'a, E> {
    /// Create a manager that runs commands through `executor`.
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    /// Remove leftovers of earlier runs before setup.
    pub async fn clean_prior(&self, node: &TargetNode, workspace: &Workspace) -> SweepReport {
        tracing::debug!("[{}] pre-clean of {}", node.role, workspace.name());
        self.sweep(node, &workspace.leftover_patterns()).await
    }

    /// Remove the workspace and every leftover at teardown.
    ///
    /// Safe to call any number of times; missing targets are not errors.
    pub async fn clean_all(&self, node: &TargetNode, workspace: &Workspace) -> SweepReport {
        tracing::info!("[{}] deleting leftovers", node.role);
        self.sweep(node, &workspace.leftover_patterns()).await
    }

    /// Run one forced recursive delete per pattern.
    ///
    /// A failing pattern is logged and the sweep moves on to the next one.
    pub async fn sweep(&self, node: &TargetNode, patterns: &[String]) -> SweepReport {
        let mut report = SweepReport::default();
        for pattern in patterns {
            report.attempted += 1;
            let command = RemoteCommand::raw(format!("sudo rm -rf {pattern}"));
            match self.executor.execute(node, &command, Capture::Discard).await {
                Ok(output) if output.success() => {}
                Ok(output) => {
                    report.failed += 1;
                    tracing::warn!(
                        "[{}] failed to delete {}: exit={} {}",
                        node.role,
                        pattern,
                        output.exit_code,
                        output.stderr.trim()
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!("[{}] failed to delete {}: {}", node.role, pattern, e);
                }
            }
        }
        report
    }

    /// Make the workspace directory.
    pub async fn create(
        &self,
        node: &TargetNode,
        workspace: &Workspace,
    ) -> Result<(), ProvisioningError> {
        let command = RemoteCommand::argv(["mkdir", workspace.name()]);
        self.executor
            .execute_ok(node, &command, Capture::Discard)
            .await
            .map_err(|e| ProvisioningError::step(SetupStep::WorkspaceCreation, &node.host, e))?;
        tracing::debug!("[{}] created workspace {}", node.role, workspace.name());
        Ok(())
    }
}
