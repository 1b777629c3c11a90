//! Shell command lines sent to remote nodes.
//!
//! `ssh` hands its command argument to the remote login shell, so every
//! command is ultimately one shell line. Arguments built with
//! [`RemoteCommand::argv`] are quoted; [`RemoteCommand::raw`] is passed through
//! untouched for globs, `$HOME` and command chaining.

use std::fmt;

/// A single shell command line to run on a remote node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCommand(String);

impl RemoteCommand {
    /// Build a command from arguments, quoting each one.
    pub fn argv<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let line = args
            .into_iter()
            .map(|arg| shell_quote(arg.as_ref()))
            .collect::<Vec<_>>()
            .join(" ");
        Self(line)
    }

    /// Use a shell line verbatim.
    pub fn raw(line: impl Into<String>) -> Self {
        Self(line.into())
    }

    /// Chain another command that only runs if this one succeeds (`&&`).
    pub fn and(self, next: RemoteCommand) -> Self {
        Self(format!("{} && {}", self.0, next.0))
    }

    /// Chain another command that runs regardless (`;`).
    pub fn then(self, next: RemoteCommand) -> Self {
        Self(format!("{} ; {}", self.0, next.0))
    }

    /// The shell line.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Quote a string for safe use as one shell word.
///
/// Plain words are returned bare; anything else is wrapped in single quotes
/// with embedded quotes escaped as `'\''`.
pub fn shell_quote(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }
    if s.chars().all(|c| {
        c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | ':' | '=' | '+' | ',')
    }) {
        return s.to_string();
    }
    format!("'{}'", s.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_plain_words_bare() {
        assert_eq!(shell_quote("mkdir"), "mkdir");
        assert_eq!(shell_quote("io_test_1700000000/venv"), "io_test_1700000000/venv");
    }

    #[test]
    fn quote_spaces_and_quotes() {
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("hello world"), "'hello world'");
        assert_eq!(shell_quote("it's"), "'it'\\''s'");
        assert_eq!(shell_quote("$HOME"), "'$HOME'");
        assert_eq!(shell_quote("*.json"), "'*.json'");
    }

    #[test]
    fn argv_joins_quoted_words() {
        let cmd = RemoteCommand::argv(["git", "clone", "-b", "wip branch"]);
        assert_eq!(cmd.as_str(), "git clone -b 'wip branch'");
    }

    #[test]
    fn chaining() {
        let cmd = RemoteCommand::argv(["cd", "ws"])
            .and(RemoteCommand::raw("ls"))
            .then(RemoteCommand::raw("true"));
        assert_eq!(cmd.to_string(), "cd ws && ls ; true");
    }
}
