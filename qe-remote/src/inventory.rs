//! Role → node inventory.
//!
//! The inventory is loaded from a TOML file:
//!
//! ```toml
//! [roles."client.0"]
//! host = "10.0.0.5"
//! user = "cephuser"
//!
//! [roles."client.1"]
//! host = "10.0.0.6"
//! port = 2222
//! ```

use rgw_qe_types::RoleId;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::{InventoryError, TargetNode};

/// Resolves a role identifier to a connectable node.
pub trait Inventory: Send + Sync {
    /// Look up the node for `role`, or `None` if the role is not known.
    fn resolve(&self, role: &RoleId) -> Option<TargetNode>;
}

/// Connection details for one role.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HostEntry {
    /// Hostname or IP address.
    pub host: String,
    /// SSH user.
    #[serde(default)]
    pub user: Option<String>,
    /// SSH port.
    #[serde(default)]
    pub port: Option<u16>,
}

/// Fixed inventory, usually read from a TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StaticInventory {
    /// Known roles. Keys are validated as role identifiers on load.
    #[serde(default)]
    roles: BTreeMap<RoleId, HostEntry>,
}

impl StaticInventory {
    /// Create an empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a role (builder style).
    pub fn with_role(mut self, role: RoleId, entry: HostEntry) -> Self {
        self.roles.insert(role, entry);
        self
    }

    /// Load an inventory from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, including role
    /// keys without the `client.` prefix.
    pub fn from_file(path: &Path) -> Result<Self, InventoryError> {
        let content = std::fs::read_to_string(path).map_err(|e| InventoryError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| InventoryError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Number of known roles.
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// True if no roles are known.
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl Inventory for StaticInventory {
    fn resolve(&self, role: &RoleId) -> Option<TargetNode> {
        self.roles.get(role).map(|entry| TargetNode {
            role: role.clone(),
            host: entry.host.clone(),
            user: entry.user.clone(),
            port: entry.port,
        })
    }
}
