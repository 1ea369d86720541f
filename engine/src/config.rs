//! Parser configuration.
//!
//! [`ParserConfig`] carries everything about a parser that is not part of
//! the destination record's declarations. It deserializes from JSON or YAML
//! with every key optional.
//!
//! # Example YAML
//!
//! ```yaml
//! program: mycli
//! version: "1.2.0"
//! env_prefix: MYCLI_
//! strict_subcommands: true
//! ```

use serde::{Deserialize, Serialize};

/// Settings for a [`Parser`](crate::Parser).
///
/// # Examples
///
/// ```
/// use argbind::ParserConfig;
///
/// let config = ParserConfig {
///     program: Some("mycli".into()),
///     env_prefix: Some("MYCLI_".into()),
///     ..Default::default()
/// };
/// assert_eq!(config.env_var("PORT"), "MYCLI_PORT");
/// assert!(!config.ignore_env);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Root command name; derived from the record's type name when unset.
    pub program: Option<String>,
    /// One-line description shown in help output.
    pub description: Option<String>,
    /// Version string; enables the root `--version` flag.
    pub version: Option<String>,
    /// Prepended to every declared environment variable name.
    pub env_prefix: Option<String>,
    /// Skip the environment fallback entirely.
    pub ignore_env: bool,
    /// Skip declared defaults.
    pub ignore_default: bool,
    /// Subcommands see only their own flags, not their ancestors'.
    pub strict_subcommands: bool,
}

impl ParserConfig {
    /// Full environment variable name for a declared `env` name.
    pub fn env_var(&self, declared: &str) -> String {
        match &self.env_prefix {
            Some(prefix) => format!("{prefix}{declared}"),
            None => declared.to_string(),
        }
    }
}
