//! Python runtime provisioning inside a workspace.

use rgw_qe_remote::{shell_quote, Capture, RemoteCommand, RemoteExecutor, TargetNode};

use crate::error::{ProvisioningError, SetupStep};
use crate::workspace::Workspace;

/// Builds the workspace venv and installs the payload's dependencies.
pub struct RuntimeProvisioner<'a, E: ?Sized> {
    executor: &'a E,
    packages: &'a [String],
}

impl<'a, E: RemoteExecutor + ?Sized> RuntimeProvisioner<'a, E> {
    /// Create a provisioner installing `packages`.
    pub fn new(executor: &'a E, packages: &'a [String]) -> Self {
        Self { executor, packages }
    }

    /// The composite create/activate/install/deactivate command.
    pub fn command(&self, workspace: &Workspace) -> RemoteCommand {
        let venv = workspace.venv();
        let install = std::iter::once("pip3 install".to_string())
            .chain(self.packages.iter().map(|p| shell_quote(p)))
            .collect::<Vec<_>>()
            .join(" ");

        RemoteCommand::argv(["python3", "-m", "venv", venv.as_str()])
            .and(RemoteCommand::raw(format!(
                "source {}/bin/activate",
                shell_quote(&venv)
            )))
            .and(RemoteCommand::raw(install))
            .and(RemoteCommand::raw("deactivate"))
    }

    /// Create the venv and install packages as one remote action.
    pub async fn provision(
        &self,
        node: &TargetNode,
        workspace: &Workspace,
    ) -> Result<(), ProvisioningError> {
        tracing::info!("[{}] provisioning venv in {}", node.role, workspace.venv());
        self.executor
            .execute_ok(node, &self.command(workspace), Capture::Discard)
            .await
            .map_err(|e| ProvisioningError::step(SetupStep::RuntimeProvisioning, &node.host, e))?;
        Ok(())
    }
}
