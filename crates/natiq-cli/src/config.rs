//! `natiq.toml` configuration (SPEC_FULL §6.K). Grounded on the teacher's
//! `rhai_common::config::Config`: a plain serde struct, loaded from disk
//! when present and merged with command-line flags, which always win.

use crate::args::{Colors, NatiqArgs};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub verbose: Option<bool>,
    pub colors: Option<String>,
}

impl Config {
    /// Load `path` if given, else look for `natiq.toml` in the current
    /// directory. Absence of a config file is not an error - defaults apply.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let candidate = match path {
            Some(path) => Some(path.to_path_buf()),
            None => {
                let default: PathBuf = "natiq.toml".into();
                default.exists().then_some(default)
            }
        };

        let Some(candidate) = candidate else {
            return Ok(Self::default());
        };

        let text = std::fs::read_to_string(&candidate)
            .with_context(|| format!("failed to read {}", candidate.display()))?;
        toml::from_str(&text).with_context(|| format!("failed to parse {}", candidate.display()))
    }

    /// Resolved logging settings: CLI flags take priority over the file,
    /// the file takes priority over built-in defaults.
    #[must_use]
    pub fn resolve_logging(&self, args: &NatiqArgs) -> ResolvedLogging {
        let verbose = args.verbose || self.logging.verbose.unwrap_or(false);
        let colors = match args.colors {
            Colors::Always => Some(true),
            Colors::Never => Some(false),
            Colors::Auto => match self.logging.colors.as_deref() {
                Some("always") => Some(true),
                Some("never") => Some(false),
                _ => None,
            },
        };
        ResolvedLogging { verbose, colors }
    }
}

pub struct ResolvedLogging {
    pub verbose: bool,
    /// `None` means "decide from whether stderr is a terminal".
    pub colors: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn cli_verbose_flag_overrides_absent_file_setting() {
        let config = Config::default();
        let args = NatiqArgs::parse_from(["natiq", "--verbose", "run"]);
        assert!(config.resolve_logging(&args).verbose);
    }
}
