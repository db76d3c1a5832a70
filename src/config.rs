//! Configuration - logging setup for the embedding program
//!
//! Loaded from a TOML file (`bufbridge.toml` by convention):
//!
//! ```toml
//! [logging]
//! level = "debug"
//! json = false
//! spans = false
//! ```
//!
//! Missing sections and keys fall back to defaults. Environment variables
//! override file values through [`InteropConfig::with_env_overrides`].

use crate::logging::{self, LogConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteropConfig {
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub file: Option<String>,

    #[serde(default = "default_false")]
    pub json: bool,

    #[serde(default = "default_false")]
    pub spans: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_level(),
            file: None,
            json: false,
            spans: false,
        }
    }
}

fn default_false() -> bool { false }
fn default_level() -> String { "info".to_string() }

impl InteropConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `BUFBRIDGE_*` environment variables on top of this config
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(level) = std::env::var("BUFBRIDGE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(path) = std::env::var("BUFBRIDGE_LOG_FILE") {
            self.logging.file = Some(path);
        }
        if std::env::var("BUFBRIDGE_LOG_JSON").is_ok() {
            self.logging.json = true;
        }
        if std::env::var("BUFBRIDGE_LOG_SPANS").is_ok() {
            self.logging.spans = true;
        }
        self
    }

    /// Logging configuration described by the `[logging]` section
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            level: logging::parse_level(&self.logging.level),
            log_path: self.logging.file.clone(),
            json_format: self.logging.json,
            show_spans: self.logging.spans,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = InteropConfig::default();
        assert!(config.logging.file.is_none());
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = InteropConfig::from_toml_str("[logging]\nlevel = \"trace\"\n").unwrap();
        assert!(!config.logging.spans);
        assert_eq!(config.logging.level, "trace");
        assert_eq!(config.log_config().level, logging::Level::TRACE);
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nfile = \"bridge.log\"\njson = true").unwrap();

        let config = InteropConfig::from_file(file.path()).unwrap();
        assert_eq!(config.logging.file.as_deref(), Some("bridge.log"));
        assert!(config.logging.json);
        assert!(config.log_config().json_format);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = InteropConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn test_invalid_toml() {
        let err = InteropConfig::from_toml_str("[logging]\njson = \"sometimes\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
