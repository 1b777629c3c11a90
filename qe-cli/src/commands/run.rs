//! Run a test session.

use anyhow::{Context, Result};
use rgw_qe_remote::{SshExecutor, StaticInventory};
use rgw_qe_session::{SessionOrchestrator, SuiteConfig};
use std::path::Path;

/// Run the run command.
pub async fn run(task_path: &Path, inventory_path: &Path, suite: SuiteConfig) -> Result<()> {
    let task = super::load_task(task_path).await?;
    let inventory = StaticInventory::from_file(inventory_path)?;
    let executor = SshExecutor::new(suite.connect_timeout_secs);
    let orchestrator = SessionOrchestrator::new(executor, inventory, suite);

    match orchestrator.run(&task).await {
        Ok(session) => {
            println!("PASS {} (run {})", session.test, session.run);
            for node in &session.nodes {
                println!("  {}: {:?}", node.node, node.readiness);
            }
            Ok(())
        }
        Err(e) => {
            println!("FAIL {}", task.test);
            for failure in e.failures() {
                println!("  {}", failure);
            }
            Err(e).context("Session failed")
        }
    }
}
