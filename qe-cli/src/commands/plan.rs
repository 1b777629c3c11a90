//! Show what a task resolves to.

use anyhow::Result;
use rgw_qe_session::{render_config, SuiteConfig};
use std::path::Path;

/// Run the plan command.
pub async fn run(task_path: &Path, suite: &SuiteConfig) -> Result<()> {
    let task = super::load_task(task_path).await?;
    let roles = task
        .clients
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    println!("=== rgw-qe plan ===");
    println!();
    println!("Test:    {}", task.test);
    println!("Version: {}", task.test_version);
    println!(
        "Script:  {}/{}",
        suite.repo_name,
        task.script_path(&suite.layouts)
    );
    println!(
        "Config:  {}/{}",
        suite.repo_name,
        task.config_path(&suite.layouts)
    );
    println!("Roles:   {}", roles);
    println!("Repo:    {} ({})", suite.repo_url, suite.branch);

    match &task.config {
        Some(payload) => {
            println!("Publish: yes");
            println!();
            print!("{}", render_config(payload)?);
        }
        None => println!("Publish: no"),
    }

    Ok(())
}
