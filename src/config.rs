//! Application configuration, read once at startup from a TOML file.

use crate::debugger::rpc::api::LoadConfig;
use crate::{muted_error, weak_error};
use log::error;
use serde::Deserialize;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use strum_macros::{Display, EnumString, IntoStaticStr};

/// What `step` without arguments does.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, EnumString, Display, IntoStaticStr, Deserialize)]
pub enum DefaultStep {
    /// Plain step into the first call.
    #[default]
    #[strum(serialize = "first")]
    #[serde(rename = "first")]
    First,
    /// Step into the last call on the current line.
    #[strum(serialize = "last")]
    #[serde(rename = "last")]
    Last,
}

/// Debugger session configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Stop at any breakpoint hit while `next`/`step`/`stepout` is in progress.
    pub stop_on_next_breakpoint: bool,
    pub default_step: DefaultStep,
    /// Maximum string length loaded by expression evaluation.
    pub max_string_len: i64,
    /// Maximum number of array items loaded by expression evaluation.
    pub max_array_values: i64,
    /// Command (argv) used by `rebuild`.
    pub rebuild_command: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            stop_on_next_breakpoint: false,
            default_step: DefaultStep::First,
            max_string_len: 64,
            max_array_values: 64,
            rebuild_command: ["go", "build", "-gcflags=all=-N -l"]
                .into_iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl SessionConfig {
    /// Load configuration for expression evaluation.
    pub fn load_config(&self) -> LoadConfig {
        LoadConfig {
            max_string_len: self.max_string_len,
            max_array_values: self.max_array_values,
            ..LoadConfig::default()
        }
    }
}

/// Console user interface config.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Save command history in a regular file.
    pub save_history: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub session: SessionConfig,
    pub ui: UiConfig,
}

impl Config {
    const DEFAULT_PATH: &'static str = ".config/gostalker/config.toml";
    const HISTORY_PATH: &'static str = ".config/gostalker/history";

    /// Load config from file. Return [`None`] on errors.
    /// If path is not set, config is loaded from the default location if it exists.
    pub fn from_file(path: Option<&Path>) -> Option<Self> {
        let data = match path {
            None => {
                let path = home::home_dir()?.join(Self::DEFAULT_PATH);
                muted_error!(read_to_string(path))?
            }
            Some(path) => match read_to_string(path) {
                Ok(data) => data,
                Err(err) => {
                    error!("Error while load config file: {err}");
                    return None;
                }
            },
        };

        weak_error!(Self::parse(&data))
    }

    pub fn parse(data: &str) -> Result<Self, toml::de::Error> {
        toml::de::from_str(data)
    }

    /// Path to command history file.
    pub fn history_path() -> Option<PathBuf> {
        Some(home::home_dir()?.join(Self::HISTORY_PATH))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_parse_config() {
        let config = Config::parse(
            r#"
            [session]
            stop_on_next_breakpoint = true
            default_step = "last"
            max_string_len = 256
            rebuild_command = ["make", "debug"]

            [ui]
            save_history = true
            "#,
        )
        .unwrap();

        assert!(config.session.stop_on_next_breakpoint);
        assert_eq!(config.session.default_step, DefaultStep::Last);
        assert_eq!(config.session.max_string_len, 256);
        assert_eq!(config.session.max_array_values, 64);
        assert_eq!(config.session.rebuild_command, vec!["make", "debug"]);
        assert!(config.ui.save_history);
    }

    #[test]
    fn test_empty_config() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(
            config.session.rebuild_command,
            vec!["go", "build", "-gcflags=all=-N -l"]
        );
    }

    #[test]
    fn test_default_step_from_str() {
        assert_eq!(DefaultStep::from_str("last").unwrap(), DefaultStep::Last);
        assert_eq!(DefaultStep::from_str("first").unwrap(), DefaultStep::First);
        assert!(DefaultStep::from_str("middle").is_err());
    }

    #[test]
    fn test_load_config() {
        let session = SessionConfig {
            max_string_len: 10,
            max_array_values: 5,
            ..Default::default()
        };
        let cfg = session.load_config();
        assert_eq!(cfg.max_string_len, 10);
        assert_eq!(cfg.max_array_values, 5);
        assert!(cfg.follow_pointers);
    }
}
