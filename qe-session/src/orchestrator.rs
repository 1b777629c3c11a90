//! Session orchestration.
//!
//! # Lifecycle
//!
//! ```text
//! for each role:  resolve → pre-clean → mkdir → clone → [publish] →
//!                 venv → readiness → payload
//! then:           body (only if every node succeeded)
//! always:         teardown sweep on every configured role
//! ```
//!
//! A failing node stops its own chain only. Failures are collected and
//! surfaced as [`SessionError::NodesFailed`] once teardown has run.

use futures_util::FutureExt;
use rgw_qe_remote::{shell_quote, Capture, Inventory, RemoteCommand, RemoteExecutor, TargetNode};
use rgw_qe_types::{RoleId, RunId, TaskSpec, TestId};
use serde_yaml::Value;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use crate::config::SuiteConfig;
use crate::error::{
    NodeFailure, ProvisioningError, Result, SessionError, SetupStep, TestExecutionError,
};
use crate::publish::ConfigPublisher;
use crate::readiness::{Readiness, ServiceReadinessGuard};
use crate::runtime::RuntimeProvisioner;
use crate::workspace::{Workspace, WorkspaceManager};

/// Lines of payload stderr kept in a [`TestExecutionError`].
const STDERR_TAIL_LINES: usize = 20;

/// One node that completed setup and ran its payload.
#[derive(Debug, Clone)]
pub struct NodeSession {
    /// The resolved node.
    pub node: TargetNode,
    /// Absolute remote path of the published config, if any.
    pub config_path: Option<String>,
    /// How the backing service was brought up.
    pub readiness: Readiness,
}

/// View of a session whose nodes are all set up.
#[derive(Debug, Clone)]
pub struct ReadySession {
    /// Test being run.
    pub test: TestId,
    /// Identity of this run.
    pub run: RunId,
    /// Workspace used on every node.
    pub workspace: Workspace,
    /// Nodes in task order.
    pub nodes: Vec<NodeSession>,
}

/// Drives one test session across the task's nodes.
pub struct SessionOrchestrator<E, I> {
    executor: E,
    inventory: I,
    suite: SuiteConfig,
}

impl<E: RemoteExecutor, I: Inventory> SessionOrchestrator<E, I> {
    /// Create an orchestrator over the given collaborators.
    pub fn new(executor: E, inventory: I, suite: SuiteConfig) -> Self {
        Self {
            executor,
            inventory,
            suite,
        }
    }

    /// Parse a raw task value and run it.
    ///
    /// A malformed task is rejected before any remote call.
    pub async fn run_value(&self, value: &Value) -> Result<ReadySession> {
        let task = TaskSpec::from_value(value)?;
        self.run(&task).await
    }

    /// Run a session with nothing to do between setup and teardown.
    pub async fn run(&self, task: &TaskSpec) -> Result<ReadySession> {
        self.scoped(task, |session| async move { session }).await
    }

    /// Set up every node, run `body`, then tear down.
    ///
    /// Teardown runs for every configured role whatever happened before it,
    /// including a panic during setup or in `body`, which is resumed
    /// afterwards.
    pub async fn scoped<F, Fut, T>(&self, task: &TaskSpec, body: F) -> Result<T>
    where
        F: FnOnce(ReadySession) -> Fut,
        Fut: Future<Output = T>,
    {
        let run = RunId::now();
        let workspace = Workspace::for_run(&task.test, run);
        tracing::info!(
            "starting {} (run {}, {} node(s))",
            task.test,
            run,
            task.clients.len()
        );

        let setup = AssertUnwindSafe(async {
            let mut nodes = Vec::with_capacity(task.clients.len());
            let mut failures = Vec::new();
            for role in &task.clients {
                match self.run_node(task, role, &workspace).await {
                    Ok(node) => nodes.push(node),
                    Err(failure) => {
                        tracing::error!("[{}] {}", role, failure);
                        failures.push(failure);
                    }
                }
            }
            (nodes, failures)
        })
        .catch_unwind()
        .await;

        let (nodes, failures) = match setup {
            Ok(done) => done,
            Err(panic) => {
                tracing::error!("setup of {} panicked, tearing down", task.test);
                self.teardown(task, &workspace).await;
                std::panic::resume_unwind(panic)
            }
        };

        let outcome = if failures.is_empty() {
            let session = ReadySession {
                test: task.test.clone(),
                run,
                workspace: workspace.clone(),
                nodes,
            };
            Some(
                AssertUnwindSafe(async move { body(session).await })
                    .catch_unwind()
                    .await,
            )
        } else {
            None
        };

        self.teardown(task, &workspace).await;

        match outcome {
            Some(Ok(value)) => {
                tracing::info!("{} completed on all nodes", task.test);
                Ok(value)
            }
            Some(Err(panic)) => std::panic::resume_unwind(panic),
            None => Err(SessionError::NodesFailed {
                failures,
                total: task.clients.len(),
            }),
        }
    }

    async fn run_node(
        &self,
        task: &TaskSpec,
        role: &RoleId,
        workspace: &Workspace,
    ) -> std::result::Result<NodeSession, NodeFailure> {
        let provisioning = |source| NodeFailure::Provisioning {
            role: role.clone(),
            source,
        };

        let node = self
            .inventory
            .resolve(role)
            .ok_or_else(|| provisioning(ProvisioningError::UnresolvedRole { role: role.clone() }))?;
        let (config_path, readiness) = self
            .setup_node(task, &node, workspace)
            .await
            .map_err(provisioning)?;
        self.invoke_payload(task, &node, workspace).await?;

        Ok(NodeSession {
            node,
            config_path,
            readiness,
        })
    }

    async fn setup_node(
        &self,
        task: &TaskSpec,
        node: &TargetNode,
        workspace: &Workspace,
    ) -> std::result::Result<(Option<String>, Readiness), ProvisioningError> {
        let workspaces = WorkspaceManager::new(&self.executor);
        workspaces.clean_prior(node, workspace).await;
        workspaces.create(node, workspace).await?;

        tracing::info!("[{}] cloning {} to {}", node.role, self.suite.repo_url, node.host);
        let clone = RemoteCommand::argv(["cd", workspace.name()]).and(RemoteCommand::argv([
            "git",
            "clone",
            self.suite.repo_url.as_str(),
            "-b",
            self.suite.branch.as_str(),
        ]));
        self.executor
            .execute_ok(node, &clone, Capture::Discard)
            .await
            .map_err(|e| ProvisioningError::step(SetupStep::RepositoryClone, &node.host, e))?;

        let config_path = match &task.config {
            Some(payload) => Some(
                ConfigPublisher::new(&self.executor, &self.suite)
                    .publish(node, task, payload, workspace)
                    .await?,
            ),
            None => None,
        };

        RuntimeProvisioner::new(&self.executor, &self.suite.packages)
            .provision(node, workspace)
            .await?;

        let readiness = ServiceReadinessGuard::new(
            &self.executor,
            &self.suite.service,
            self.suite.settle_before(),
            self.suite.settle_after(),
        )
        .ensure_active(node)
        .await?;

        Ok((config_path, readiness))
    }

    /// The payload command line, run from the remote home.
    pub fn payload_command(&self, task: &TaskSpec, workspace: &Workspace) -> RemoteCommand {
        let script = format!(
            "{}/{}",
            self.suite.repo_name,
            task.script_path(&self.suite.layouts)
        );
        let config = format!(
            "{}/{}",
            self.suite.repo_name,
            task.config_path(&self.suite.layouts)
        );
        RemoteCommand::argv(["cd", workspace.name()]).then(RemoteCommand::raw(format!(
            "sudo venv/bin/python3 {} -c {}",
            shell_quote(&script),
            shell_quote(&config)
        )))
    }

    async fn invoke_payload(
        &self,
        task: &TaskSpec,
        node: &TargetNode,
        workspace: &Workspace,
    ) -> std::result::Result<(), NodeFailure> {
        let command = self.payload_command(task, workspace);
        tracing::info!("[{}] running {}", node.role, task.script);
        tracing::debug!("[{}] {}", node.role, command);

        let output = self
            .executor
            .execute(node, &command, Capture::Discard)
            .await
            .map_err(|e| NodeFailure::Provisioning {
                role: node.role.clone(),
                source: ProvisioningError::step(SetupStep::PayloadLaunch, &node.host, e),
            })?;

        if !output.success() {
            return Err(TestExecutionError {
                role: node.role.clone(),
                host: node.host.clone(),
                exit_code: output.exit_code,
                stderr: stderr_tail(&output.stderr),
            }
            .into());
        }
        tracing::info!("[{}] test passed", node.role);
        Ok(())
    }

    async fn teardown(&self, task: &TaskSpec, workspace: &Workspace) {
        let workspaces = WorkspaceManager::new(&self.executor);
        for role in &task.clients {
            let Some(node) = self.inventory.resolve(role) else {
                tracing::warn!("[{}] no node to tear down", role);
                continue;
            };
            tracing::info!("[{}] test completed", role);
            let report = workspaces.clean_all(&node, workspace).await;
            if !report.is_clean() {
                tracing::warn!(
                    "[{}] teardown left {} of {} pattern(s) undeleted",
                    role,
                    report.failed,
                    report.attempted
                );
            }
        }
    }
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rgw_qe_remote::{
        ExecOutput, HostEntry, MockExecutor, RecordedCall, RemoteError, Reply, StaticInventory,
    };
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Delegates to a mock, panicking on commands that contain `pattern`.
    struct PanicOn {
        inner: MockExecutor,
        pattern: &'static str,
    }

    #[async_trait::async_trait]
    impl RemoteExecutor for PanicOn {
        async fn execute(
            &self,
            node: &TargetNode,
            command: &RemoteCommand,
            capture: Capture,
        ) -> std::result::Result<ExecOutput, RemoteError> {
            if command.as_str().contains(self.pattern) {
                panic!("executor failed on {}", self.pattern);
            }
            self.inner.execute(node, command, capture).await
        }

        async fn transfer_file(
            &self,
            local_path: &Path,
            node: &TargetNode,
            remote_path: &str,
        ) -> std::result::Result<(), RemoteError> {
            self.inner.transfer_file(local_path, node, remote_path).await
        }
    }

    fn entry(host: &str) -> HostEntry {
        HostEntry {
            host: host.to_string(),
            user: None,
            port: None,
        }
    }

    fn inventory() -> StaticInventory {
        StaticInventory::new()
            .with_role(RoleId::parse("client.0").unwrap(), entry("node-a"))
            .with_role(RoleId::parse("client.1").unwrap(), entry("node-b"))
    }

    fn suite(tmp: &std::path::Path) -> SuiteConfig {
        SuiteConfig {
            settle_before_secs: 0,
            settle_after_secs: 0,
            local_tmp_dir: tmp.to_path_buf(),
            ..SuiteConfig::default()
        }
    }

    fn mock() -> MockExecutor {
        let mock = MockExecutor::new();
        mock.on("is-active", Reply::ok("active\n"))
            .on("echo $HOME", Reply::ok("/home/cephuser\n"));
        mock
    }

    fn deletes(commands: &[String]) -> usize {
        commands.iter().filter(|c| c.starts_with("sudo rm -rf")).count()
    }

    fn payload_runs(commands: &[String]) -> usize {
        commands
            .iter()
            .filter(|c| c.contains("venv/bin/python3"))
            .count()
    }

    #[tokio::test]
    async fn missing_test_makes_no_remote_calls() {
        let tmp = tempfile::tempdir().unwrap();
        let mock = mock();
        let orch = SessionOrchestrator::new(mock.clone(), inventory(), suite(tmp.path()));

        let value: Value = serde_yaml::from_str("clients: [client.0]").unwrap();
        let err = orch.run_value(&value).await.unwrap_err();
        assert!(matches!(err, SessionError::Configuration(_)));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn single_node_session_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let mock = mock();
        let orch = SessionOrchestrator::new(mock.clone(), inventory(), suite(tmp.path()));
        let task = TaskSpec::from_yaml_str("test: test_Mbuckets_with_Nobjects").unwrap();

        let session = orch.run(&task).await.unwrap();
        assert_eq!(session.nodes.len(), 1);
        assert_eq!(session.nodes[0].readiness, Readiness::AlreadyActive);
        assert!(session.nodes[0].config_path.is_none());

        let ws = session.workspace.name().to_string();
        let commands = mock.commands_on("node-a");
        // 11 pre-clean, mkdir, clone, venv, is-active, payload, 11 teardown
        assert_eq!(commands.len(), 27);
        assert_eq!(commands[11], format!("mkdir {ws}"));
        assert_eq!(
            commands[12],
            format!(
                "cd {ws} && git clone https://github.com/red-hat-storage/ceph-qe-scripts.git -b master"
            )
        );
        assert!(commands[13].starts_with(&format!("python3 -m venv {ws}/venv")));
        assert_eq!(commands[14], "sudo systemctl is-active ceph-radosgw.target");
        assert_eq!(
            commands[15],
            format!(
                "cd {ws} ; sudo venv/bin/python3 \
                 ceph-qe-scripts/rgw/v2/tests/s3_swift/test_Mbuckets_with_Nobjects.py \
                 -c ceph-qe-scripts/rgw/v2/tests/s3_swift/configs/test_Mbuckets_with_Nobjects.yaml"
            )
        );
        assert_eq!(deletes(&commands[16..]), 11);
    }

    #[tokio::test]
    async fn no_transfer_without_config() {
        let tmp = tempfile::tempdir().unwrap();
        let mock = mock();
        let orch = SessionOrchestrator::new(mock.clone(), inventory(), suite(tmp.path()));
        let task = TaskSpec::from_yaml_str("test: io_test\nclients: [client.0, client.1]").unwrap();

        orch.run(&task).await.unwrap();
        assert!(mock.transfers().is_empty());
        assert!(!mock.commands().iter().any(|c| c.contains("echo $HOME")));
    }

    #[tokio::test]
    async fn config_is_published_into_repo() {
        let tmp = tempfile::tempdir().unwrap();
        let mock = mock();
        let orch = SessionOrchestrator::new(mock.clone(), inventory(), suite(tmp.path()));
        let task = TaskSpec::from_yaml_str(
            "test: test_bucket_lifecycle\ntest_version: v1\nconfig:\n  objects_count: 10\n",
        )
        .unwrap();

        let session = orch.run(&task).await.unwrap();
        let ws = session.workspace.name();
        let expected = format!(
            "/home/cephuser/{ws}/ceph-qe-scripts/rgw/v1/tests/s3/yamls/test_bucket_lifecycle.yaml"
        );
        assert_eq!(session.nodes[0].config_path.as_deref(), Some(expected.as_str()));

        match &mock.transfers()[..] {
            [RecordedCall::Transfer { remote_path, .. }] => assert_eq!(remote_path, &expected),
            other => panic!("unexpected transfers {other:?}"),
        }
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn provisioning_failure_on_second_node_still_cleans_both() {
        let tmp = tempfile::tempdir().unwrap();
        let mock = mock();
        mock.on_host("node-b", "pip3 install", Reply::fail(1));
        let orch = SessionOrchestrator::new(mock.clone(), inventory(), suite(tmp.path()));
        let task = TaskSpec::from_yaml_str("test: io_test\nclients: [client.0, client.1]").unwrap();

        let err = orch.run(&task).await.unwrap_err();
        match &err {
            SessionError::NodesFailed { failures, total } => {
                assert_eq!(*total, 2);
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].role().as_str(), "client.1");
                assert!(matches!(
                    &failures[0],
                    NodeFailure::Provisioning {
                        source: ProvisioningError::Step {
                            step: SetupStep::RuntimeProvisioning,
                            ..
                        },
                        ..
                    }
                ));
            }
            other => panic!("unexpected error {other:?}"),
        }

        let a = mock.commands_on("node-a");
        let b = mock.commands_on("node-b");
        assert_eq!(payload_runs(&a), 1);
        assert_eq!(payload_runs(&b), 0);
        // pre-clean + teardown on both
        assert_eq!(deletes(&a), 22);
        assert_eq!(deletes(&b), 22);
        assert!(b.last().unwrap().starts_with("sudo rm -rf"));
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_next_node() {
        let tmp = tempfile::tempdir().unwrap();
        let mock = mock();
        mock.on_host("node-a", "venv/bin/python3", Reply::fail(2));
        let orch = SessionOrchestrator::new(mock.clone(), inventory(), suite(tmp.path()));
        let task = TaskSpec::from_yaml_str("test: io_test\nclients: [client.0, client.1]").unwrap();

        let err = orch.run(&task).await.unwrap_err();
        let failures = err.failures();
        assert_eq!(failures.len(), 1);
        match &failures[0] {
            NodeFailure::TestExecution(e) => {
                assert_eq!(e.host, "node-a");
                assert_eq!(e.exit_code, 2);
            }
            other => panic!("unexpected failure {other:?}"),
        }
        assert_eq!(payload_runs(&mock.commands_on("node-b")), 1);
    }

    #[tokio::test]
    async fn unresolved_role_is_reported_and_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let mock = mock();
        let orch = SessionOrchestrator::new(mock.clone(), inventory(), suite(tmp.path()));
        let task = TaskSpec::from_yaml_str("test: io_test\nclients: [client.0, client.7]").unwrap();

        let err = orch.run(&task).await.unwrap_err();
        assert!(matches!(
            &err.failures()[0],
            NodeFailure::Provisioning {
                source: ProvisioningError::UnresolvedRole { .. },
                ..
            }
        ));
        assert_eq!(deletes(&mock.commands_on("node-a")), 22);
    }

    #[tokio::test]
    async fn body_skipped_when_a_node_failed() {
        let tmp = tempfile::tempdir().unwrap();
        let mock = mock();
        mock.on("git clone", Reply::fail(128));
        let orch = SessionOrchestrator::new(mock.clone(), inventory(), suite(tmp.path()));
        let task = TaskSpec::from_yaml_str("test: io_test").unwrap();

        let ran = AtomicBool::new(false);
        let result = orch
            .scoped(&task, |_| async {
                ran.store(true, Ordering::SeqCst);
            })
            .await;
        assert!(result.is_err());
        assert!(!ran.load(Ordering::SeqCst));
        assert_eq!(deletes(&mock.commands()), 22);
    }

    #[tokio::test]
    async fn body_sees_ready_nodes_and_its_output_is_returned() {
        let tmp = tempfile::tempdir().unwrap();
        let mock = mock();
        let orch = SessionOrchestrator::new(mock.clone(), inventory(), suite(tmp.path()));
        let task = TaskSpec::from_yaml_str("test: io_test\nclients: [client.0, client.1]").unwrap();

        let hosts = orch
            .scoped(&task, |session| async move {
                session
                    .nodes
                    .iter()
                    .map(|n| n.node.host.clone())
                    .collect::<Vec<_>>()
            })
            .await
            .unwrap();
        assert_eq!(hosts, ["node-a", "node-b"]);
    }

    #[tokio::test]
    async fn panic_in_body_still_tears_down() {
        let tmp = tempfile::tempdir().unwrap();
        let mock = mock();
        let orch = SessionOrchestrator::new(mock.clone(), inventory(), suite(tmp.path()));
        let task = TaskSpec::from_yaml_str("test: io_test").unwrap();

        let result = AssertUnwindSafe(orch.scoped::<_, _, ()>(&task, |_| async { panic!("boom") }))
            .catch_unwind()
            .await;
        assert!(result.is_err());

        let commands = mock.commands();
        assert_eq!(deletes(&commands), 22);
        assert!(commands.last().unwrap().starts_with("sudo rm -rf"));
    }

    #[tokio::test]
    async fn panic_during_setup_still_tears_down() {
        let tmp = tempfile::tempdir().unwrap();
        let mock = mock();
        let executor = PanicOn {
            inner: mock.clone(),
            pattern: "pip3 install",
        };
        let orch = SessionOrchestrator::new(executor, inventory(), suite(tmp.path()));
        let task = TaskSpec::from_yaml_str("test: io_test\nclients: [client.0, client.1]").unwrap();

        let result = AssertUnwindSafe(orch.run(&task)).catch_unwind().await;
        assert!(result.is_err());

        // node-a got pre-clean and teardown; node-b was never reached but is still swept
        assert_eq!(deletes(&mock.commands_on("node-a")), 22);
        assert_eq!(deletes(&mock.commands_on("node-b")), 11);
        assert_eq!(payload_runs(&mock.commands()), 0);
        assert!(mock.commands().last().unwrap().starts_with("sudo rm -rf"));
    }

    #[test]
    fn stderr_tail_keeps_last_lines() {
        let stderr = (0..30).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
        let tail = stderr_tail(&stderr);
        assert_eq!(tail.lines().count(), STDERR_TAIL_LINES);
        assert!(tail.starts_with("10\n"));
        assert!(tail.ends_with("29"));
    }
}
