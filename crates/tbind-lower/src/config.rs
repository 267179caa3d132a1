//! Engine options and the `tbind.toml` file they are loaded from.
//!
//! ```toml
//! [lower]
//! target = "es2015"
//! synthetic_prefix = "__tb"
//! on_reject = "drop"
//! globals = ["$", "_"]
//!
//! [diagnostics]
//! deny_warnings = false
//! ```
//!
//! Every key is optional. Unknown keys are rejected so typos surface.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Output dialect. Decides how synthetic bindings are declared and which
/// scoped expression wraps an expression-form construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// `var` bindings, `function` IIFEs.
    Es5,
    /// `let` bindings, arrow IIFEs.
    #[default]
    Es2015,
}

/// What happens to a construct rejected with a fatal diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RejectPolicy {
    /// Remove the declaration; an expression site becomes `void 0`.
    #[default]
    Drop,
    /// Emit the original text unchanged.
    Keep,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LowerOptions {
    pub target: Target,
    pub synthetic_prefix: String,
    pub on_reject: RejectPolicy,
    /// Names treated as bound in the global scope, for shadow detection and
    /// for resolving step-1 references.
    pub globals: Vec<String>,
}

impl Default for LowerOptions {
    fn default() -> Self {
        Self {
            target: Target::default(),
            synthetic_prefix: "__tb".to_string(),
            on_reject: RejectPolicy::default(),
            globals: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiagnosticsConfig {
    /// Treat warnings as errors when deciding the exit status.
    pub deny_warnings: bool,
}

/// Contents of a `tbind.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub lower: LowerOptions,
    pub diagnostics: DiagnosticsConfig,
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    InvalidPrefix(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            ConfigError::Parse(err) => write!(f, "failed to parse config: {}", err.message()),
            ConfigError::InvalidPrefix(prefix) => {
                write!(f, "synthetic_prefix `{prefix}` is not a valid identifier")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse(err) => Some(err),
            ConfigError::InvalidPrefix(_) => None,
        }
    }
}

impl Config {
    /// Read and validate a config file.
    pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse and validate config text.
    pub fn parse(content: &str) -> Result<Config, ConfigError> {
        let config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.lower.validate()?;
        Ok(config)
    }
}

impl LowerOptions {
    /// The synthetic prefix must itself be an identifier, or emitted names
    /// would not parse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut chars = self.synthetic_prefix.chars();
        let valid = chars.next().is_some_and(tbind_lexer::is_ident_start)
            && chars.all(tbind_lexer::is_ident_continue);
        if valid {
            Ok(())
        } else {
            Err(ConfigError::InvalidPrefix(self.synthetic_prefix.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.lower.synthetic_prefix, "__tb");
        assert_eq!(config.lower.target, Target::Es2015);
        assert_eq!(config.lower.on_reject, RejectPolicy::Drop);
    }

    #[test]
    fn full_file() {
        let config = Config::parse(
            r#"
[lower]
target = "es5"
synthetic_prefix = "_t"
on_reject = "keep"
globals = ["$", "jQuery"]

[diagnostics]
deny_warnings = true
"#,
        )
        .unwrap();
        assert_eq!(config.lower.target, Target::Es5);
        assert_eq!(config.lower.synthetic_prefix, "_t");
        assert_eq!(config.lower.on_reject, RejectPolicy::Keep);
        assert_eq!(config.lower.globals, vec!["$", "jQuery"]);
        assert!(config.diagnostics.deny_warnings);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = Config::parse("[lower]\ntarget = \"es5\"\nprefix = \"x\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "{err}");
    }

    #[test]
    fn bad_target_is_rejected() {
        assert!(Config::parse("[lower]\ntarget = \"es2099\"\n").is_err());
    }

    #[test]
    fn prefix_must_be_an_identifier() {
        let err = Config::parse("[lower]\nsynthetic_prefix = \"1x\"\n").unwrap_err();
        assert_eq!(err.to_string(), "synthetic_prefix `1x` is not a valid identifier");
        assert!(Config::parse("[lower]\nsynthetic_prefix = \"\"\n").is_err());
    }
}
