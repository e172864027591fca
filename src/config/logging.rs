//! `[logging]` section: filter level and the optional JSON log file

use serde::Deserialize;
use std::path::PathBuf;

/// How often the JSON log file rolls over
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Hourly,
    #[default]
    Daily,
    Never,
}

impl LogRotation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Never => "never",
        }
    }
}

/// Resolved logging settings
///
/// Logs always go to stderr. Setting `dir` adds a JSON file in that
/// directory, which is how a host collects picker logs without parsing the
/// terminal stream.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Filter level for the picker crates: trace, debug, info, warn, error
    pub level: String,
    pub dir: Option<PathBuf>,
    pub rotation: LogRotation,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
            rotation: LogRotation::Daily,
        }
    }
}

/// `[logging]` as written in the config file
#[derive(Debug, Deserialize, Default)]
pub struct FileLogging {
    pub level: Option<String>,
    pub dir: Option<PathBuf>,
    pub rotation: Option<LogRotation>,
}

impl From<Option<FileLogging>> for LoggingConfig {
    fn from(file: Option<FileLogging>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            level: file.level.unwrap_or(defaults.level),
            dir: file.dir,
            rotation: file.rotation.unwrap_or(defaults.rotation),
        }
    }
}
