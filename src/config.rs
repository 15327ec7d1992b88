//! Rewriter settings, loadable from a TOML file.
use serde::{Deserialize, Serialize};
use std::fs::read_to_string;
use std::path::Path;
use thiserror::Error;

use crate::constants::{builtin_function, FunctionFlags};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RewriterConfig {
    /// Functions that don't collapse to null when an argument is null.
    /// Anything the function library flags as null dependent is added to this list.
    pub null_dependent_functions: Vec<String>,

    /// Group name given to synthesized inline views.
    ///
    /// _Default:_ `X__1`
    pub inline_view_name: String,

    /// Replace a call to a virtual procedure that only forwards to one command with that command.
    ///
    /// _Default:_ `true`
    pub unwrap_procedures: bool,

    /// Move functions off the column side of a comparison with a constant.
    ///
    /// _Default:_ `true`
    pub invert_compare_functions: bool,
}

impl Default for RewriterConfig {
    fn default() -> Self {
        RewriterConfig {
            null_dependent_functions: [
                "IFNULL",
                "NVL",
                "COALESCE",
                "NULLIF",
                "CONCAT2",
                "DECODESTRING",
                "DECODEINTEGER",
                "COUNT",
                "SUM",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            inline_view_name: "X__1".to_string(),
            unwrap_procedures: true,
            invert_compare_functions: true,
        }
    }
}

impl RewriterConfig {
    pub fn from_toml(source: &str) -> Result<RewriterConfig, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Load the configuration from disk or use defaults.
    pub fn load(path: &Path) -> Result<RewriterConfig, ConfigError> {
        match read_to_string(path) {
            Ok(source) => {
                let config = RewriterConfig::from_toml(&source)?;
                debug!("loaded \"{}\"", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    "\"{}\" doesn't exist, loading defaults instead",
                    path.display()
                );
                Ok(RewriterConfig::default())
            }
            Err(e) => Err(ConfigError::Io(e)),
        }
    }

    pub fn is_null_dependent(&self, name: &str) -> bool {
        if self
            .null_dependent_functions
            .iter()
            .any(|f| f.eq_ignore_ascii_case(name))
        {
            return true;
        }
        builtin_function(name)
            .map(|flags| flags.contains(FunctionFlags::NULL_DEPENDENT))
            .unwrap_or(false)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}
