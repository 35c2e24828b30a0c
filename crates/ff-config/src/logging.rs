use std::path::PathBuf;

use serde::Deserialize;

/// Logging configuration. Every field has a default, so the struct can be
/// assembled from CLI flags or deserialized from a config file verbatim.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Global log level filter (e.g. `"info"`, `"debug"`).
    pub level: String,
    /// Optional file path for a second log output.
    pub file: Option<PathBuf>,
    /// Output format: `plain` (human-readable) or `json` (structured).
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            format: LogFormat::Plain,
        }
    }
}

impl LoggingConfig {
    /// Configuration for one run, with `--verbose` / `--log-file` applied.
    pub fn from_flags(verbose: bool, file: Option<PathBuf>) -> Self {
        Self {
            level: if verbose { "debug" } else { "info" }.to_string(),
            file,
            format: LogFormat::Plain,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Plain,
    Json,
}
