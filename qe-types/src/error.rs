//! Error types for task validation.

use thiserror::Error;

/// Errors raised while validating a task invocation.
///
/// All of these are detected before any remote side effect happens.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The task configuration is not a key-value mapping.
    #[error("task configuration must be a mapping")]
    NotAMapping,

    /// The mandatory `test` key is absent.
    #[error("task configuration is missing the required `test` key")]
    MissingTest,

    /// A known key carries a value of the wrong shape.
    #[error("invalid `{field}`: expected {expected}")]
    InvalidField {
        /// Offending key.
        field: &'static str,
        /// What the key should hold.
        expected: &'static str,
    },

    /// A role identifier does not carry the `client.` prefix.
    #[error("invalid role `{role}`: roles must look like `client.<id>`")]
    InvalidRole {
        /// The rejected role string.
        role: String,
    },

    /// `test_version` names a script set that does not exist.
    #[error("unknown test_version `{value}` (expected v1 or v2)")]
    UnknownTestVersion {
        /// The rejected value.
        value: String,
    },

    /// The task document is not valid YAML.
    #[error("task document is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
