//! Configuration for tty-focus.
//!
//! This module provides:
//! - TOML configuration file loading from `~/.tty-focus/config.toml`
//! - Defaults for every field, so a partial file is valid
//!
//! # Configuration File
//!
//! ```toml
//! [input]
//! # Quiet period after which a lone ESC is a keypress
//! escape_timeout_ms = 50
//! read_buffer_size = 1024
//!
//! [dispatch]
//! queue_capacity = 32
//! batch_quota = 16
//!
//! [log]
//! level = "info"
//! file = "~/.tty-focus/tty-focus.log"
//!
//! [selector]
//! entries = ["git status", "cargo test"]
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::ui::{DEFAULT_BATCH_QUOTA, DEFAULT_QUEUE_CAPACITY};

const APP_DIR: &str = ".tty-focus";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub dispatch: DispatchConfig,
    pub log: LogConfig,
    pub selector: SelectorConfig,
}

/// Byte source settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub escape_timeout_ms: u64,
    pub read_buffer_size: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            escape_timeout_ms: 50,
            read_buffer_size: 1024,
        }
    }
}

/// Dispatcher limits
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub queue_capacity: usize,
    pub batch_quota: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            batch_quota: DEFAULT_BATCH_QUOTA,
        }
    }
}

/// Log settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// Log file; defaults to `~/.tty-focus/tty-focus.log`
    pub file: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Selection list settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Initial entries, oldest first
    pub entries: Vec<String>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            entries: vec![
                "echo hello".to_string(),
                "git status".to_string(),
                "cargo test".to_string(),
            ],
        }
    }
}

impl Config {
    /// Load configuration from `~/.tty-focus/config.toml`.
    ///
    /// A missing file (or no home directory) yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn default_path() -> Option<PathBuf> {
        app_dir().map(|dir| dir.join("config.toml"))
    }

    pub fn escape_timeout(&self) -> Duration {
        Duration::from_millis(self.input.escape_timeout_ms.max(1))
    }

    /// Resolved log file path, with a leading `~` expanded
    pub fn log_path(&self) -> Option<PathBuf> {
        match &self.log.file {
            Some(file) => Some(expand_home(file)),
            None => app_dir().map(|dir| dir.join("tty-focus.log")),
        }
    }
}

fn app_dir() -> Option<PathBuf> {
    home_dir().map(|home| home.join(APP_DIR))
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE")
        .or_else(|| std::env::var_os("HOME"))
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [input]
            escape_timeout_ms = 25

            [dispatch]
            batch_quota = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.input.escape_timeout_ms, 25);
        assert_eq!(config.input.read_buffer_size, 1024);
        assert_eq!(config.dispatch.queue_capacity, 32);
        assert_eq!(config.dispatch.batch_quota, 4);
        assert_eq!(config.log, LogConfig::default());
        assert_eq!(config.escape_timeout(), Duration::from_millis(25));
    }

    #[test]
    fn test_empty_file_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_selector_entries() {
        let config: Config = toml::from_str("[selector]\nentries = [\"a\", \"b\"]").unwrap();
        assert_eq!(config.selector.entries, vec!["a", "b"]);
    }

    #[test]
    fn test_load_from_reports_errors() {
        let dir = std::env::temp_dir().join(format!("tty-focus-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let missing = dir.join("missing.toml");
        assert!(matches!(
            Config::load_from(&missing),
            Err(ConfigError::Read { .. })
        ));

        let bad = dir.join("bad.toml");
        fs::write(&bad, "[input]\nescape_timeout_ms = \"soon\"").unwrap();
        assert!(matches!(
            Config::load_from(&bad),
            Err(ConfigError::Parse { .. })
        ));

        let good = dir.join("good.toml");
        fs::write(&good, "[log]\nlevel = \"debug\"").unwrap();
        assert_eq!(Config::load_from(&good).unwrap().log.level, "debug");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_zero_timeout_is_clamped() {
        let mut config = Config::default();
        config.input.escape_timeout_ms = 0;
        assert_eq!(config.escape_timeout(), Duration::from_millis(1));
    }

    #[test]
    fn test_explicit_log_file() {
        let mut config = Config::default();
        config.log.file = Some("/tmp/tty-focus.log".to_string());
        assert_eq!(config.log_path(), Some(PathBuf::from("/tmp/tty-focus.log")));
    }
}
