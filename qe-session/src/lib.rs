//! # rgw-qe-session
//!
//! Lifecycle of one remote RGW IO test session.
//!
//! ```text
//! TaskSpec ──► SessionOrchestrator ──► per node:
//!                                        WorkspaceManager   (sweep, mkdir)
//!                                        ConfigPublisher    (render, scp)
//!                                        RuntimeProvisioner (venv, pip)
//!                                        ServiceReadinessGuard
//!                                        payload
//!                                  ──► teardown on every node
//! ```
//!
//! - [`SessionOrchestrator`] - Scoped setup / body / guaranteed teardown
//! - [`SuiteConfig`] - Immutable suite parameters, loaded from TOML
//! - [`SessionError`] - Configuration errors and aggregated node failures

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod error;
mod orchestrator;
mod publish;
mod readiness;
mod runtime;
mod workspace;

pub use config::{SuiteConfig, SuiteConfigError};
pub use error::{
    NodeFailure, ProvisioningError, Result, SessionError, SetupStep, TestExecutionError,
};
pub use orchestrator::{NodeSession, ReadySession, SessionOrchestrator};
pub use publish::{local_artifact_prefix, render_config, ConfigPublisher, CONFIG_KEY};
pub use readiness::{Readiness, ServiceReadinessGuard};
pub use runtime::RuntimeProvisioner;
pub use workspace::{SweepReport, Workspace, WorkspaceManager, PAYLOAD_LEFTOVERS, VENV_DIR};
