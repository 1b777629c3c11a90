//! Error types for the remote layer.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from running commands on, or copying files to, a remote node.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The local `ssh`/`scp` process could not be spawned.
    #[error("ssh spawn error: {0}")]
    Spawn(#[from] std::io::Error),

    /// The remote command exited non-zero.
    #[error("command failed on {host}: exit={exit_code}, stderr={stderr}")]
    CommandFailed {
        /// Target host.
        host: String,
        /// Exit code (-1 when the process was killed by a signal).
        exit_code: i32,
        /// Standard error output.
        stderr: String,
    },

    /// File transfer failed.
    #[error("transfer failed: {0}")]
    TransferFailed(String),
}

/// Errors loading the node inventory.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Failed to read the inventory file.
    #[error("failed to read inventory {path}: {source}")]
    ReadError {
        /// Path to the inventory file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the inventory file.
    #[error("failed to parse inventory {path}: {source}")]
    ParseError {
        /// Path to the inventory file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_failed_display() {
        let err = RemoteError::CommandFailed {
            host: "10.0.0.5".into(),
            exit_code: 2,
            stderr: "mkdir: cannot create directory".into(),
        };
        assert_eq!(
            err.to_string(),
            "command failed on 10.0.0.5: exit=2, stderr=mkdir: cannot create directory"
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RemoteError>();
        assert_send_sync::<InventoryError>();
    }
}
