//! Sweep leftovers of earlier runs.

use anyhow::Result;
use rgw_qe_remote::{Inventory, SshExecutor, StaticInventory};
use rgw_qe_session::{SuiteConfig, Workspace, WorkspaceManager};
use rgw_qe_types::{RoleId, TestId};
use std::path::Path;

/// Run the clean command.
pub async fn run(
    inventory_path: &Path,
    test: &str,
    roles: &[String],
    suite: &SuiteConfig,
) -> Result<()> {
    let test = TestId::parse(test)?;
    let roles = if roles.is_empty() {
        vec![RoleId::default_client()]
    } else {
        roles
            .iter()
            .map(|r| RoleId::parse(r))
            .collect::<Result<Vec<_>, _>>()?
    };

    let inventory = StaticInventory::from_file(inventory_path)?;
    let executor = SshExecutor::new(suite.connect_timeout_secs);
    let manager = WorkspaceManager::new(&executor);
    let workspace = Workspace::any_run(&test);

    let mut unresolved = Vec::new();
    for role in &roles {
        let Some(node) = inventory.resolve(role) else {
            tracing::warn!("[{}] not in inventory", role);
            unresolved.push(role.as_str());
            continue;
        };
        let report = manager.clean_all(&node, &workspace).await;
        println!(
            "{}: {} pattern(s), {} failed",
            node, report.attempted, report.failed
        );
    }

    if !unresolved.is_empty() {
        anyhow::bail!("No node for role(s): {}", unresolved.join(", "));
    }
    Ok(())
}
