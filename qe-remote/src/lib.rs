//! # rgw-qe-remote
//!
//! Remote execution layer for rgw-qe.
//!
//! ```text
//! SessionOrchestrator → RemoteExecutor → ssh/scp → node
//!          ↓
//!      Inventory (role → node)
//! ```
//!
//! - [`RemoteExecutor`] - run a command on a node, copy a file to a node
//! - [`SshExecutor`] - the real implementation, shelling out to `ssh`/`scp`
//! - [`MockExecutor`] - records calls and replays scripted results
//! - [`Inventory`] / [`StaticInventory`] - resolve `client.N` roles to nodes

#![warn(missing_docs)]
#![warn(clippy::all)]

mod command;
mod error;
mod executor;
mod inventory;
mod mock;
mod ssh;

pub use command::{shell_quote, RemoteCommand};
pub use error::{InventoryError, RemoteError};
pub use executor::{Capture, ExecOutput, RemoteExecutor, TargetNode};
pub use inventory::{HostEntry, Inventory, StaticInventory};
pub use mock::{MockExecutor, RecordedCall, Reply};
pub use ssh::SshExecutor;
