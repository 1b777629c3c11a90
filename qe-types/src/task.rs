//! Parsed task invocation.
//!
//! A task arrives as a YAML mapping:
//!
//! ```yaml
//! test: test_Mbuckets_with_Nobjects
//! script: test_Mbuckets_with_Nobjects.py   # default: <test>.py
//! test_version: v2                          # v1 | v2, default v2
//! clients: [client.0, client.1]             # default: [client.0]
//! config:                                   # optional inline test config
//!   user_count: 1
//!   bucket_count: 2
//! ```

use serde_yaml::{Mapping, Value};

use crate::{ConfigurationError, RoleId, ScriptLayouts, TestId, TestVersion};

const KNOWN_KEYS: [&str; 5] = ["test", "script", "test_version", "clients", "config"];

/// A validated task invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSpec {
    /// Test identifier.
    pub test: TestId,
    /// Test payload file name inside the script directory.
    pub script: String,
    /// Script set to use.
    pub test_version: TestVersion,
    /// Target roles, in processing order.
    pub clients: Vec<RoleId>,
    /// Inline test configuration, published to each node when present.
    pub config: Option<Value>,
}

impl TaskSpec {
    /// Build a task with defaults for everything but the test id.
    pub fn new(test: TestId) -> Self {
        Self {
            script: format!("{test}.py"),
            test,
            test_version: TestVersion::default(),
            clients: vec![RoleId::default_client()],
            config: None,
        }
    }

    /// Parse a task from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigurationError> {
        let value: Value = serde_yaml::from_str(text)?;
        Self::from_value(&value)
    }

    /// Validate a task configuration value.
    ///
    /// `null` is treated as an empty mapping, which then fails for the
    /// missing `test` key.
    pub fn from_value(value: &Value) -> Result<Self, ConfigurationError> {
        let empty = Mapping::new();
        let mapping = match value {
            Value::Null => &empty,
            Value::Mapping(mapping) => mapping,
            _ => return Err(ConfigurationError::NotAMapping),
        };

        for key in mapping.keys() {
            match key.as_str() {
                Some(k) if KNOWN_KEYS.contains(&k) => {}
                _ => tracing::debug!("ignoring unknown task key {:?}", key),
            }
        }

        let test = match mapping.get("test") {
            None | Some(Value::Null) => return Err(ConfigurationError::MissingTest),
            Some(Value::String(s)) => TestId::parse(s)?,
            Some(_) => {
                return Err(ConfigurationError::InvalidField {
                    field: "test",
                    expected: "a string",
                })
            }
        };

        let mut task = Self::new(test);

        match mapping.get("script") {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) if !s.is_empty() => task.script = s.clone(),
            Some(_) => {
                return Err(ConfigurationError::InvalidField {
                    field: "script",
                    expected: "a non-empty string",
                })
            }
        }

        match mapping.get("test_version") {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) => task.test_version = s.parse()?,
            Some(_) => {
                return Err(ConfigurationError::InvalidField {
                    field: "test_version",
                    expected: "v1 or v2",
                })
            }
        }

        match mapping.get("clients") {
            None | Some(Value::Null) => {}
            Some(Value::Sequence(roles)) if !roles.is_empty() => {
                task.clients = roles
                    .iter()
                    .map(|role| match role {
                        Value::String(s) => RoleId::parse(s),
                        other => Err(ConfigurationError::InvalidRole {
                            role: format!("{other:?}"),
                        }),
                    })
                    .collect::<Result<_, _>>()?;
            }
            Some(_) => {
                return Err(ConfigurationError::InvalidField {
                    field: "clients",
                    expected: "a non-empty list of roles",
                })
            }
        }

        task.config = match mapping.get("config") {
            None | Some(Value::Null) => None,
            Some(payload) => Some(payload.clone()),
        };

        Ok(task)
    }

    /// Script path relative to the repository root.
    pub fn script_path(&self, layouts: &ScriptLayouts) -> String {
        format!("{}/{}", layouts.get(self.test_version).script_dir, self.script)
    }

    /// Config file name (`<test>.yaml`).
    pub fn config_file_name(&self) -> String {
        format!("{}.yaml", self.test)
    }

    /// Config path relative to the repository root.
    pub fn config_path(&self, layouts: &ScriptLayouts) -> String {
        format!(
            "{}/{}",
            layouts.get(self.test_version).config_dir,
            self.config_file_name()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<TaskSpec, ConfigurationError> {
        TaskSpec::from_yaml_str(text)
    }

    #[test]
    fn defaults_resolve_v2_paths() {
        let task = parse("test: io_test\nclients: [client.0]\n").unwrap();
        let layouts = ScriptLayouts::default();
        assert_eq!(task.test_version, TestVersion::V2);
        assert_eq!(task.script, "io_test.py");
        assert_eq!(task.script_path(&layouts), "rgw/v2/tests/s3_swift/io_test.py");
        assert_eq!(
            task.config_path(&layouts),
            "rgw/v2/tests/s3_swift/configs/io_test.yaml"
        );
        assert!(task.config.is_none());
    }

    #[test]
    fn v1_with_custom_script() {
        let task = parse("test: io_test\ntest_version: v1\nscript: custom.py\n").unwrap();
        let layouts = ScriptLayouts::default();
        assert_eq!(task.script_path(&layouts), "rgw/v1/tests/s3/custom.py");
        assert_eq!(task.config_path(&layouts), "rgw/v1/tests/s3/yamls/io_test.yaml");
        assert_eq!(task.clients, vec![RoleId::default_client()]);
    }

    #[test]
    fn missing_test_is_rejected() {
        assert!(matches!(
            parse("clients: [client.0]\n"),
            Err(ConfigurationError::MissingTest)
        ));
        assert!(matches!(parse("test: ~\n"), Err(ConfigurationError::MissingTest)));
    }

    #[test]
    fn null_document_is_missing_test() {
        assert!(matches!(parse("~"), Err(ConfigurationError::MissingTest)));
    }

    #[test]
    fn non_mapping_is_rejected() {
        assert!(matches!(
            parse("- test\n- io_test\n"),
            Err(ConfigurationError::NotAMapping)
        ));
        assert!(matches!(parse("io_test"), Err(ConfigurationError::NotAMapping)));
    }

    #[test]
    fn bad_role_prefix_is_rejected() {
        let err = parse("test: io_test\nclients: [client.0, osd.1]\n").unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidRole { ref role } if role == "osd.1"));
    }

    #[test]
    fn non_string_role_is_rejected() {
        let err = parse("test: io_test\nclients: [3]\n").unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidRole { .. }));
    }

    #[test]
    fn empty_client_list_is_rejected() {
        let err = parse("test: io_test\nclients: []\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::InvalidField { field: "clients", .. }
        ));
    }

    #[test]
    fn unknown_version_is_rejected() {
        let err = parse("test: io_test\ntest_version: v9\n").unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownTestVersion { .. }));
    }

    #[test]
    fn inline_config_is_kept() {
        let task = parse(
            "test: io_test\nconfig:\n  user_count: 1\n  objects_size_range:\n    min: 5\n    max: 15\n",
        )
        .unwrap();
        let config = task.config.expect("config payload");
        assert_eq!(config["user_count"], Value::from(1u64));
        assert_eq!(config["objects_size_range"]["max"], Value::from(15u64));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let task = parse("test: io_test\nextra: true\n").unwrap();
        assert_eq!(task.test.as_str(), "io_test");
    }

    #[test]
    fn multiple_clients_keep_order() {
        let task = parse("test: io_test\nclients: [client.1, client.0]\n").unwrap();
        let roles: Vec<_> = task.clients.iter().map(RoleId::as_str).collect();
        assert_eq!(roles, ["client.1", "client.0"]);
    }
}
