//! Error types for rgw-qe sessions.

use rgw_qe_remote::RemoteError;
use rgw_qe_types::{ConfigurationError, RoleId};
use std::fmt;
use std::path::PathBuf;

/// Setup step that failed on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStep {
    /// `mkdir` of the workspace.
    WorkspaceCreation,
    /// `git clone` of the test repository.
    RepositoryClone,
    /// `echo $HOME` on the node.
    HomeDirLookup,
    /// Copying the config artifact to the node.
    ConfigTransfer,
    /// venv creation and package install.
    RuntimeProvisioning,
    /// Restarting the backing service.
    ServiceRestart,
    /// Starting the test payload.
    PayloadLaunch,
}

impl fmt::Display for SetupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SetupStep::WorkspaceCreation => "workspace creation",
            SetupStep::RepositoryClone => "repository clone",
            SetupStep::HomeDirLookup => "home directory lookup",
            SetupStep::ConfigTransfer => "config transfer",
            SetupStep::RuntimeProvisioning => "runtime provisioning",
            SetupStep::ServiceRestart => "service restart",
            SetupStep::PayloadLaunch => "payload launch",
        };
        f.write_str(name)
    }
}

/// A remote setup step failed or could not be attempted.
#[derive(Debug, thiserror::Error)]
pub enum ProvisioningError {
    /// The inventory has no node for the role.
    #[error("no node found for role {role}")]
    UnresolvedRole {
        /// The unresolved role.
        role: RoleId,
    },

    /// A remote command or transfer failed.
    #[error("{step} failed on {host}: {source}")]
    Step {
        /// Which step failed.
        step: SetupStep,
        /// Target host.
        host: String,
        /// Underlying remote error.
        #[source]
        source: RemoteError,
    },

    /// `echo $HOME` returned nothing usable.
    #[error("home directory on {host} resolved to an empty path")]
    EmptyHomeDir {
        /// Target host.
        host: String,
    },

    /// The local temporary config file could not be written.
    #[error("failed to write config artifact {path}: {source}")]
    LocalArtifact {
        /// Local temp path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config payload could not be serialized.
    #[error("config serialization failed: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

impl ProvisioningError {
    pub(crate) fn step(step: SetupStep, host: &str, source: RemoteError) -> Self {
        ProvisioningError::Step {
            step,
            host: host.to_string(),
            source,
        }
    }
}

/// The test payload exited non-zero.
#[derive(Debug, thiserror::Error)]
#[error("test payload failed on {role} ({host}): exit={exit_code}")]
pub struct TestExecutionError {
    /// Role the payload ran for.
    pub role: RoleId,
    /// Target host.
    pub host: String,
    /// Exit status of the payload.
    pub exit_code: i32,
    /// Tail of the payload's standard error.
    pub stderr: String,
}

/// Why one node did not complete its session.
#[derive(Debug, thiserror::Error)]
pub enum NodeFailure {
    /// Setup failed; the payload was not run.
    #[error("{role}: provisioning failed: {source}")]
    Provisioning {
        /// Role whose setup failed.
        role: RoleId,
        /// The provisioning error.
        #[source]
        source: ProvisioningError,
    },

    /// The payload ran and failed.
    #[error("{0}")]
    TestExecution(#[from] TestExecutionError),
}

impl NodeFailure {
    /// Role the failure belongs to.
    pub fn role(&self) -> &RoleId {
        match self {
            NodeFailure::Provisioning { role, .. } => role,
            NodeFailure::TestExecution(e) => &e.role,
        }
    }
}

/// Error surfaced by a session, after teardown has run.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The task was rejected before any remote call.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// One or more nodes failed; every node was still torn down.
    #[error("{} of {total} node(s) failed; first: {}", .failures.len(), first_failure(.failures))]
    NodesFailed {
        /// Failures in node order.
        failures: Vec<NodeFailure>,
        /// Number of targeted nodes.
        total: usize,
    },
}

fn first_failure(failures: &[NodeFailure]) -> String {
    failures
        .first()
        .map(|f| f.to_string())
        .unwrap_or_else(|| "none".to_string())
}

impl SessionError {
    /// Per-node failures (empty for configuration errors).
    pub fn failures(&self) -> &[NodeFailure] {
        match self {
            SessionError::Configuration(_) => &[],
            SessionError::NodesFailed { failures, .. } => failures,
        }
    }
}

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
