//! Backing-service readiness check.
//!
//! ```text
//! Unknown ──query──► Active ─────────────────┐
//!            │                               ▼
//!            └──────► Inactive ──restart──► SettledReady
//! ```
//!
//! Anything other than a clean `active` answer (including an unreachable
//! node) counts as inactive. The restart is attempted once; the settle
//! window after it is trusted to cover the service coming up.

use rgw_qe_remote::{shell_quote, Capture, RemoteCommand, RemoteExecutor, TargetNode};
use std::time::Duration;

use crate::error::{ProvisioningError, SetupStep};

/// How readiness was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The service was already active.
    AlreadyActive,
    /// The service was restarted once.
    Restarted,
}

/// Ensures a systemd unit is active before the payload runs.
pub struct ServiceReadinessGuard<'a, E: ?Sized> {
    executor: &'a E,
    service: &'a str,
    settle_before: Duration,
    settle_after: Duration,
}

impl<'a, E: RemoteExecutor + ?Sized> ServiceReadinessGuard<'a, E> {
    /// Create a guard for `service` with the given settle windows.
    pub fn new(
        executor: &'a E,
        service: &'a str,
        settle_before: Duration,
        settle_after: Duration,
    ) -> Self {
        Self {
            executor,
            service,
            settle_before,
            settle_after,
        }
    }

    /// Query the service, restart it if not active, and settle.
    pub async fn ensure_active(&self, node: &TargetNode) -> Result<Readiness, ProvisioningError> {
        tracing::info!(
            "[{}] waiting {}s before checking {}",
            node.role,
            self.settle_before.as_secs(),
            self.service
        );
        tokio::time::sleep(self.settle_before).await;

        let readiness = if self.is_active(node).await {
            Readiness::AlreadyActive
        } else {
            tracing::info!("[{}] restarting {}", node.role, self.service);
            let restart = RemoteCommand::raw(format!(
                "sudo systemctl restart {}",
                shell_quote(self.service)
            ));
            self.executor
                .execute_ok(node, &restart, Capture::Discard)
                .await
                .map_err(|e| ProvisioningError::step(SetupStep::ServiceRestart, &node.host, e))?;
            Readiness::Restarted
        };

        tracing::info!(
            "[{}] starting tests after {}s settle",
            node.role,
            self.settle_after.as_secs()
        );
        tokio::time::sleep(self.settle_after).await;
        Ok(readiness)
    }

    async fn is_active(&self, node: &TargetNode) -> bool {
        let query = RemoteCommand::raw(format!(
            "sudo systemctl is-active {}",
            shell_quote(self.service)
        ));
        // is-active exits non-zero when inactive, so read stdout regardless
        match self.executor.execute(node, &query, Capture::Stdout).await {
            Ok(output) => {
                let state = output.stdout_trimmed().unwrap_or_default();
                tracing::debug!("[{}] {} is {:?}", node.role, self.service, state);
                state == "active"
            }
            Err(e) => {
                tracing::warn!("[{}] could not query {}: {}", node.role, self.service, e);
                false
            }
        }
    }
}
