//! # rgw-qe
//!
//! Runs RGW IO test sessions on remote client nodes.
//!
//! ## Commands
//!
//! - `run`: Set up each node, run the test payload, tear everything down
//! - `plan`: Show what a task file resolves to, without touching any node
//! - `clean`: Sweep leftovers of earlier runs of a test
//!
//! ## Example
//!
//! ```bash
//! # Inspect a task
//! rgw-qe plan --task bucket_lifecycle.yaml
//!
//! # Run it against the nodes in an inventory
//! rgw-qe run --task bucket_lifecycle.yaml --inventory hosts.toml
//!
//! # Remove whatever an interrupted run left behind
//! rgw-qe clean --inventory hosts.toml --test test_bucket_lifecycle --role client.0
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{clean, plan, run};

/// Runs RGW IO test sessions on remote client nodes.
#[derive(Parser, Debug)]
#[command(name = "rgw-qe")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log filter, e.g. `debug` or `rgw_qe_session=debug` (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one test session
    Run {
        /// Task file (YAML)
        #[arg(long)]
        task: PathBuf,

        /// Role → host inventory (TOML)
        #[arg(long)]
        inventory: PathBuf,

        /// Suite configuration (TOML); built-in defaults if omitted
        #[arg(long)]
        suite: Option<PathBuf>,
    },

    /// Show the resolved paths and roles of a task
    Plan {
        /// Task file (YAML)
        #[arg(long)]
        task: PathBuf,

        /// Suite configuration (TOML); built-in defaults if omitted
        #[arg(long)]
        suite: Option<PathBuf>,
    },

    /// Delete leftovers of every run of a test
    Clean {
        /// Role → host inventory (TOML)
        #[arg(long)]
        inventory: PathBuf,

        /// Test identifier whose workspaces are removed
        #[arg(long)]
        test: String,

        /// Role to clean (repeatable; default client.0)
        #[arg(long = "role")]
        roles: Vec<String>,

        /// Suite configuration (TOML); built-in defaults if omitted
        #[arg(long)]
        suite: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.log_level.as_deref());

    match cli.command {
        Commands::Run {
            task,
            inventory,
            suite,
        } => {
            let suite = commands::load_suite(suite.as_deref())?;
            run::run(&task, &inventory, suite).await?;
        }
        Commands::Plan { task, suite } => {
            let suite = commands::load_suite(suite.as_deref())?;
            plan::run(&task, &suite).await?;
        }
        Commands::Clean {
            inventory,
            test,
            roles,
            suite,
        } => {
            let suite = commands::load_suite(suite.as_deref())?;
            clean::run(&inventory, &test, &roles, &suite).await?;
        }
    }

    Ok(())
}

/// Set up the tracing subscriber. Logs go to stderr so stdout stays clean.
fn setup_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
