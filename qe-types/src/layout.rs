//! Script-set layout of the test repository.
//!
//! Each `test_version` selects a (script directory, config directory) pair
//! inside the cloned repository.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ConfigurationError;

/// Which generation of the test scripts to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestVersion {
    /// `rgw/v1` scripts (S3 only).
    V1,
    /// `rgw/v2` scripts (S3 and Swift).
    #[default]
    V2,
}

impl FromStr for TestVersion {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "v1" => Ok(Self::V1),
            "v2" => Ok(Self::V2),
            other => Err(ConfigurationError::UnknownTestVersion {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for TestVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestVersion::V1 => write!(f, "v1"),
            TestVersion::V2 => write!(f, "v2"),
        }
    }
}

/// Directories of one script set, relative to the repository root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptLayout {
    /// Directory holding the test scripts.
    pub script_dir: String,
    /// Directory holding the bundled YAML configs.
    pub config_dir: String,
}

impl ScriptLayout {
    fn new(script_dir: &str, config_dir: &str) -> Self {
        Self {
            script_dir: script_dir.to_string(),
            config_dir: config_dir.to_string(),
        }
    }
}

/// The version → layout lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptLayouts {
    /// Layout for [`TestVersion::V1`].
    #[serde(default = "default_v1")]
    pub v1: ScriptLayout,
    /// Layout for [`TestVersion::V2`].
    #[serde(default = "default_v2")]
    pub v2: ScriptLayout,
}

fn default_v1() -> ScriptLayout {
    ScriptLayout::new("rgw/v1/tests/s3", "rgw/v1/tests/s3/yamls")
}

fn default_v2() -> ScriptLayout {
    ScriptLayout::new("rgw/v2/tests/s3_swift", "rgw/v2/tests/s3_swift/configs")
}

impl Default for ScriptLayouts {
    fn default() -> Self {
        Self {
            v1: default_v1(),
            v2: default_v2(),
        }
    }
}

impl ScriptLayouts {
    /// Look up the layout for a version.
    pub fn get(&self, version: TestVersion) -> &ScriptLayout {
        match version {
            TestVersion::V1 => &self.v1,
            TestVersion::V2 => &self.v2,
        }
    }
}
