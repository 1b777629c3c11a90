//! SSH execution via the system `ssh` and `scp` binaries.
//!
//! Uses `tokio::process::Command`. Authentication is not handled here;
//! keys must already be accepted by the target nodes (BatchMode).

use async_trait::async_trait;
use std::path::Path;

use crate::{Capture, ExecOutput, RemoteCommand, RemoteError, RemoteExecutor, TargetNode};

/// [`RemoteExecutor`] that shells out to `ssh` and `scp`.
#[derive(Debug, Clone)]
pub struct SshExecutor {
    connect_timeout_secs: u64,
}

impl Default for SshExecutor {
    fn default() -> Self {
        Self::new(30)
    }
}

impl SshExecutor {
    /// Create an executor with the given connect timeout.
    pub fn new(connect_timeout_secs: u64) -> Self {
        Self {
            connect_timeout_secs,
        }
    }

    fn common_options(&self) -> Vec<String> {
        vec![
            "-o".into(),
            "StrictHostKeyChecking=no".into(),
            "-o".into(),
            format!("ConnectTimeout={}", self.connect_timeout_secs),
            "-o".into(),
            "BatchMode=yes".into(),
        ]
    }

    fn ssh_args(&self, node: &TargetNode, command: &RemoteCommand) -> Vec<String> {
        let mut args = self.common_options();
        if let Some(port) = node.port {
            args.push("-p".into());
            args.push(port.to_string());
        }
        args.push(node.destination());
        args.push(command.as_str().to_string());
        args
    }

    fn scp_args(&self, local_path: &Path, node: &TargetNode, remote_path: &str) -> Vec<String> {
        let mut args = self.common_options();
        if let Some(port) = node.port {
            args.push("-P".into());
            args.push(port.to_string());
        }
        args.push(local_path.to_string_lossy().into_owned());
        args.push(format!("{}:{}", node.destination(), remote_path));
        args
    }
}

#[async_trait]
impl RemoteExecutor for SshExecutor {
    async fn execute(
        &self,
        node: &TargetNode,
        command: &RemoteCommand,
        capture: Capture,
    ) -> Result<ExecOutput, RemoteError> {
        tracing::debug!("[{}] $ {}", node.host, command);
        let output = tokio::process::Command::new("ssh")
            .args(self.ssh_args(node, command))
            .output()
            .await?;

        let stdout = match capture {
            Capture::Stdout => Some(String::from_utf8_lossy(&output.stdout).to_string()),
            Capture::Discard => None,
        };

        Ok(ExecOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout,
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    async fn transfer_file(
        &self,
        local_path: &Path,
        node: &TargetNode,
        remote_path: &str,
    ) -> Result<(), RemoteError> {
        tracing::debug!("[{}] scp {} -> {}", node.host, local_path.display(), remote_path);
        let output = tokio::process::Command::new("scp")
            .args(self.scp_args(local_path, node, remote_path))
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RemoteError::TransferFailed(format!(
                "scp to {}:{} failed: {}",
                node.destination(),
                remote_path,
                stderr.trim()
            )));
        }

        Ok(())
    }
}
