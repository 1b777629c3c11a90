//! Mock executor for testing.
//!
//! Records every call and replays scripted replies, so session logic can be
//! exercised without any remote node.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::{Capture, ExecOutput, RemoteCommand, RemoteError, RemoteExecutor, TargetNode};

/// A call observed by [`MockExecutor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    /// `execute()` was called.
    Execute {
        /// Target host.
        host: String,
        /// Shell line.
        command: String,
        /// Requested capture mode.
        capture: Capture,
    },
    /// `transfer_file()` was called.
    Transfer {
        /// Target host.
        host: String,
        /// Local source path.
        local_path: PathBuf,
        /// Remote destination path.
        remote_path: String,
        /// Contents of the local file at transfer time (None if unreadable).
        contents: Option<String>,
    },
}

/// Scripted reply for commands matching a rule.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Exit with the given code and stdout.
    Exit {
        /// Exit code.
        code: i32,
        /// Stdout to hand back when captured.
        stdout: String,
    },
    /// The node cannot be reached; `execute()` itself errors.
    Unreachable,
}

impl Reply {
    /// Exit 0 with the given stdout.
    pub fn ok(stdout: &str) -> Self {
        Reply::Exit {
            code: 0,
            stdout: stdout.to_string(),
        }
    }

    /// Exit with a non-zero code and no output.
    pub fn fail(code: i32) -> Self {
        Reply::Exit {
            code,
            stdout: String::new(),
        }
    }
}

#[derive(Debug)]
struct Rule {
    host: Option<String>,
    pattern: String,
    reply: Reply,
}

/// Mock executor for testing.
///
/// Rules are matched in insertion order by host (optional) and substring of
/// the command line; the first match wins. Unmatched commands exit 0 with
/// empty output.
#[derive(Debug, Default)]
pub struct MockExecutor {
    inner: Arc<Mutex<MockExecutorInner>>,
}

#[derive(Debug, Default)]
struct MockExecutorInner {
    calls: Vec<RecordedCall>,
    rules: Vec<Rule>,
    fail_transfers: Option<String>,
}

impl MockExecutor {
    /// Create a new mock executor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply to every command containing `pattern`.
    pub fn on(&self, pattern: &str, reply: Reply) -> &Self {
        let mut inner = self.inner.lock().unwrap();
        inner.rules.push(Rule {
            host: None,
            pattern: pattern.to_string(),
            reply,
        });
        self
    }

    /// Reply to commands containing `pattern` on `host` only.
    pub fn on_host(&self, host: &str, pattern: &str, reply: Reply) -> &Self {
        let mut inner = self.inner.lock().unwrap();
        inner.rules.push(Rule {
            host: Some(host.to_string()),
            pattern: pattern.to_string(),
            reply,
        });
        self
    }

    /// Cause every `transfer_file()` to fail with the given message.
    pub fn fail_transfers(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_transfers = Some(error.to_string());
    }

    /// All calls, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        let inner = self.inner.lock().unwrap();
        inner.calls.clone()
    }

    /// Command lines executed on `host`, in order.
    pub fn commands_on(&self, host: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RecordedCall::Execute { host: h, command, .. } if h == host => Some(command),
                _ => None,
            })
            .collect()
    }

    /// All executed command lines, in order.
    pub fn commands(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RecordedCall::Execute { command, .. } => Some(command),
                _ => None,
            })
            .collect()
    }

    /// All transfers, in order.
    pub fn transfers(&self) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, RecordedCall::Transfer { .. }))
            .collect()
    }
}

impl Clone for MockExecutor {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl RemoteExecutor for MockExecutor {
    async fn execute(
        &self,
        node: &TargetNode,
        command: &RemoteCommand,
        capture: Capture,
    ) -> Result<ExecOutput, RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(RecordedCall::Execute {
            host: node.host.clone(),
            command: command.as_str().to_string(),
            capture,
        });

        let reply = inner
            .rules
            .iter()
            .find(|rule| {
                rule.host.as_deref().map_or(true, |h| h == node.host)
                    && command.as_str().contains(&rule.pattern)
            })
            .map(|rule| rule.reply.clone())
            .unwrap_or_else(|| Reply::ok(""));

        match reply {
            Reply::Exit { code, stdout } => Ok(ExecOutput {
                exit_code: code,
                stdout: match capture {
                    Capture::Stdout => Some(stdout),
                    Capture::Discard => None,
                },
                stderr: if code == 0 {
                    String::new()
                } else {
                    format!("mock failure (exit {code})")
                },
            }),
            Reply::Unreachable => Err(RemoteError::Spawn(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                format!("{} unreachable", node.host),
            ))),
        }
    }

    async fn transfer_file(
        &self,
        local_path: &Path,
        node: &TargetNode,
        remote_path: &str,
    ) -> Result<(), RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(RecordedCall::Transfer {
            host: node.host.clone(),
            local_path: local_path.to_path_buf(),
            remote_path: remote_path.to_string(),
            contents: std::fs::read_to_string(local_path).ok(),
        });

        if let Some(error) = &inner.fail_transfers {
            return Err(RemoteError::TransferFailed(error.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rgw_qe_types::RoleId;

    fn node(host: &str) -> TargetNode {
        TargetNode::new(RoleId::default_client(), host)
    }

    #[tokio::test]
    async fn unmatched_commands_succeed_and_are_recorded() {
        let mock = MockExecutor::new();
        let out = mock
            .execute(&node("a"), &RemoteCommand::raw("ls"), Capture::Stdout)
            .await
            .unwrap();
        assert!(out.success());
        assert_eq!(out.stdout.as_deref(), Some(""));
        assert_eq!(mock.commands_on("a"), ["ls"]);
    }

    #[tokio::test]
    async fn host_rules_take_precedence_in_order() {
        let mock = MockExecutor::new();
        mock.on_host("b", "mkdir", Reply::fail(1))
            .on("mkdir", Reply::ok(""));

        let a = mock
            .execute(&node("a"), &RemoteCommand::raw("mkdir ws"), Capture::Discard)
            .await
            .unwrap();
        let b = mock
            .execute(&node("b"), &RemoteCommand::raw("mkdir ws"), Capture::Discard)
            .await
            .unwrap();
        assert!(a.success());
        assert_eq!(b.exit_code, 1);
        assert!(b.stdout.is_none());
    }

    #[tokio::test]
    async fn execute_ok_maps_non_zero_exit() {
        let mock = MockExecutor::new();
        mock.on("false", Reply::fail(3));
        let err = mock
            .execute_ok(&node("a"), &RemoteCommand::raw("false"), Capture::Discard)
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::CommandFailed { exit_code: 3, .. }));
    }

    #[tokio::test]
    async fn unreachable_errors() {
        let mock = MockExecutor::new();
        mock.on("echo", Reply::Unreachable);
        let err = mock
            .execute(&node("a"), &RemoteCommand::raw("echo $HOME"), Capture::Stdout)
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Spawn(_)));
    }

    #[tokio::test]
    async fn transfer_records_contents_and_can_fail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.yaml");
        std::fs::write(&path, "config: {}\n").unwrap();

        let mock = MockExecutor::new();
        mock.transfer_file(&path, &node("a"), "/remote/f.yaml")
            .await
            .unwrap();
        mock.fail_transfers("disk full");
        let err = mock
            .transfer_file(&path, &node("a"), "/remote/f.yaml")
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::TransferFailed(_)));

        let transfers = mock.transfers();
        assert_eq!(transfers.len(), 2);
        assert!(matches!(
            &transfers[0],
            RecordedCall::Transfer { contents: Some(c), .. } if c == "config: {}\n"
        ));
    }
}
