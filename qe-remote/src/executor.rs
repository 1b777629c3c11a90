//! Remote execution abstraction.
//!
//! # Design
//!
//! The executor is async but strictly request/response:
//! - `execute()` runs one shell line and waits for it to exit
//! - `transfer_file()` copies one local file to a remote path
//!
//! Non-zero exits are data, not errors; use `execute_ok()` when a step
//! must succeed.

use async_trait::async_trait;
use rgw_qe_types::RoleId;
use std::fmt;
use std::path::Path;

use crate::{RemoteCommand, RemoteError};

/// A resolved remote endpoint for one role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetNode {
    /// Role this node was resolved from.
    pub role: RoleId,
    /// Hostname or IP address.
    pub host: String,
    /// SSH user (defaults to the local ssh configuration).
    pub user: Option<String>,
    /// SSH port (defaults to 22).
    pub port: Option<u16>,
}

impl TargetNode {
    /// Create a node with default user and port.
    pub fn new(role: RoleId, host: impl Into<String>) -> Self {
        Self {
            role,
            host: host.into(),
            user: None,
            port: None,
        }
    }

    /// `user@host`, or just `host` when no user is configured.
    pub fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{}@{}", user, self.host),
            None => self.host.clone(),
        }
    }
}

impl fmt::Display for TargetNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.role, self.host)
    }
}

/// Whether `execute()` should hand back standard output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// Return stdout in [`ExecOutput::stdout`].
    Stdout,
    /// Drop stdout.
    Discard,
}

/// Result of running a command remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    /// Exit code (0 = success, -1 when killed by a signal).
    pub exit_code: i32,
    /// Standard output, present only with [`Capture::Stdout`].
    pub stdout: Option<String>,
    /// Standard error.
    pub stderr: String,
}

impl ExecOutput {
    /// Returns true if the command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Captured stdout with surrounding whitespace removed.
    pub fn stdout_trimmed(&self) -> Option<&str> {
        self.stdout.as_deref().map(str::trim)
    }
}

/// Runs commands on, and copies files to, remote nodes.
///
/// Implementations handle the connection mechanism (ssh, mock, etc).
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Run a shell line on `node` and wait for it to exit.
    ///
    /// Only fails if the command could not be run at all; a non-zero exit
    /// is reported in [`ExecOutput::exit_code`].
    async fn execute(
        &self,
        node: &TargetNode,
        command: &RemoteCommand,
        capture: Capture,
    ) -> Result<ExecOutput, RemoteError>;

    /// Copy a local file to `remote_path` on `node`.
    async fn transfer_file(
        &self,
        local_path: &Path,
        node: &TargetNode,
        remote_path: &str,
    ) -> Result<(), RemoteError>;

    /// Run a shell line, failing on non-zero exit.
    async fn execute_ok(
        &self,
        node: &TargetNode,
        command: &RemoteCommand,
        capture: Capture,
    ) -> Result<ExecOutput, RemoteError> {
        let output = self.execute(node, command, capture).await?;
        if !output.success() {
            return Err(RemoteError::CommandFailed {
                host: node.host.clone(),
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }
        Ok(output)
    }
}
