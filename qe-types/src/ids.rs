//! Identity types for rgw-qe sessions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ConfigurationError;

/// Prefix every target role must carry.
pub const ROLE_PREFIX: &str = "client.";

/// A logical role name such as `client.0`.
///
/// Only constructible through [`RoleId::parse`], so holding one means the
/// prefix has already been checked.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoleId(String);

impl RoleId {
    /// Parse a role string, enforcing the `client.` prefix and a non-empty id.
    pub fn parse(role: &str) -> Result<Self, ConfigurationError> {
        match role.strip_prefix(ROLE_PREFIX) {
            Some(id) if !id.is_empty() && !id.chars().any(char::is_whitespace) => {
                Ok(Self(role.to_string()))
            }
            _ => Err(ConfigurationError::InvalidRole {
                role: role.to_string(),
            }),
        }
    }

    /// The default target when a task names no clients.
    pub fn default_client() -> Self {
        Self(format!("{ROLE_PREFIX}0"))
    }

    /// The part after the prefix (`"0"` for `client.0`).
    pub fn id(&self) -> &str {
        &self.0[ROLE_PREFIX.len()..]
    }

    /// The full role string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RoleId {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RoleId {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoleId> for String {
    fn from(role: RoleId) -> Self {
        role.0
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RoleId({})", self.0)
    }
}

/// A test identifier, e.g. `test_Mbuckets_with_Nobjects`.
///
/// Doubles as the default script and config base name and as the workspace
/// prefix, so it is restricted to characters that are safe inside file names
/// and unquoted shell globs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TestId(String);

impl TestId {
    /// Validate a test identifier.
    pub fn parse(test: &str) -> Result<Self, ConfigurationError> {
        let valid = !test.is_empty()
            && test
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if valid {
            Ok(Self(test.to_string()))
        } else {
            Err(ConfigurationError::InvalidField {
                field: "test",
                expected: "a non-empty name made of [A-Za-z0-9_.-]",
            })
        }
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TestId {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TestId> for String {
    fn from(test: TestId) -> Self {
        test.0
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TestId({})", self.0)
    }
}

/// Run-scoped unique suffix: unix timestamp plus a random nonce.
///
/// The timestamp alone collides when two sessions for the same test start
/// within one second on the same node; the nonce closes that window.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId {
    timestamp: u64,
    nonce: u32,
}

impl RunId {
    /// Create a run id from the current time and fresh randomness.
    pub fn now() -> Self {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let bytes = uuid::Uuid::new_v4().into_bytes();
        let nonce = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        Self { timestamp, nonce }
    }

    /// Create a run id from known parts (for tests and replays).
    pub fn from_parts(timestamp: u64, nonce: u32) -> Self {
        Self { timestamp, nonce }
    }

    /// Workspace directory name for `test`: `<test>_<timestamp>_<nonce>`.
    pub fn workspace_name(&self, test: &TestId) -> String {
        format!("{}_{}", test, self)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{:08x}", self.timestamp, self.nonce)
    }
}

impl fmt::Debug for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RunId({})", self)
    }
}
