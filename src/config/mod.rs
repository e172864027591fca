//! Configuration for the citation picker driver
//!
//! Configuration is loaded in order of precedence:
//! 1. Environment variables (highest priority)
//! 2. Config file (~/.config/citepick/config.toml)
//! 3. Built-in defaults (lowest priority)

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

mod logging;


pub use logging::{FileLogging, LogRotation, LoggingConfig};

use crate::context::PickerSize;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ─────────────────────────────────────────────────────────────────────────────
// Application Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Requested picker size, passed through to the view unchanged
    pub size: PickerSize,

    /// CSL-JSON files loaded in addition to the document's own
    pub bibliography_files: Vec<PathBuf>,

    /// Panel keys in display order
    pub panel_order: Vec<String>,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            size: PickerSize::default(),
            bibliography_files: Vec::new(),
            panel_order: vec!["bibliography".to_string(), "doi".to_string()],
            logging: LoggingConfig::default(),
        }
    }
}

/// Bibliography settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
pub struct FileBibliography {
    pub files: Option<Vec<String>>,
}

/// Panel settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
pub struct FilePanels {
    pub order: Option<Vec<String>>,
}

/// Config file structure
#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    pub width: Option<u32>,
    pub height: Option<u32>,

    /// Optional [bibliography] section
    pub bibliography: Option<FileBibliography>,

    /// Optional [panels] section
    pub panels: Option<FilePanels>,

    /// Optional [logging] section
    pub logging: Option<FileLogging>,
}

impl Config {
    /// Get the config file path: ~/.config/citepick/config.toml
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("citepick").join("config.toml"))
    }

    /// Read the config file; a missing file yields defaults
    ///
    /// A file that exists but cannot be read or parsed is an error rather
    /// than a silent fallback.
    pub fn load_file_config(path: Option<PathBuf>) -> Result<FileConfig> {
        let Some(path) = path else {
            return Ok(FileConfig::default());
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileConfig::default()),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to read config file {}", path.display()))
            }
        }
    }

    /// Load configuration: env vars > file > defaults
    pub fn load() -> Result<Self> {
        let file = Self::load_file_config(Self::config_path())?;
        Ok(Self::from_sources(file, |name| std::env::var(name).ok()))
    }

    /// Merge a parsed file with environment lookups
    ///
    /// Recognized variables: `CITEPICK_WIDTH`, `CITEPICK_HEIGHT`,
    /// `CITEPICK_BIBLIOGRAPHY` (path-list separated by the platform
    /// separator), `CITEPICK_LOG_LEVEL`, `CITEPICK_LOG_DIR`.
    pub fn from_sources(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let width = env("CITEPICK_WIDTH")
            .and_then(|v| v.parse().ok())
            .or(file.width)
            .unwrap_or(defaults.size.width);
        let height = env("CITEPICK_HEIGHT")
            .and_then(|v| v.parse().ok())
            .or(file.height)
            .unwrap_or(defaults.size.height);

        let bibliography_files = env("CITEPICK_BIBLIOGRAPHY")
            .map(|v| std::env::split_paths(&v).collect())
            .or_else(|| {
                file.bibliography
                    .and_then(|b| b.files)
                    .map(|files| files.into_iter().map(PathBuf::from).collect())
            })
            .unwrap_or(defaults.bibliography_files);

        let panel_order = file
            .panels
            .and_then(|p| p.order)
            .filter(|order| !order.is_empty())
            .unwrap_or(defaults.panel_order);

        let mut logging = LoggingConfig::from(file.logging);
        if let Some(level) = env("CITEPICK_LOG_LEVEL") {
            logging.level = level;
        }
        if let Some(dir) = env("CITEPICK_LOG_DIR") {
            logging.dir = Some(PathBuf::from(dir));
        }

        Self {
            size: PickerSize { width, height },
            bibliography_files,
            panel_order,
            logging,
        }
    }

    /// Serialize to the config file format
    pub fn to_toml(&self) -> String {
        let files: Vec<String> = self
            .bibliography_files
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        let log_dir = match &self.logging.dir {
            Some(dir) => format!("dir = {:?}", dir.display().to_string()),
            None => "# dir = \"./logs\"".to_string(),
        };

        format!(
            r#"# citepick configuration

# Picker size requested from the host
width = {width}
height = {height}

# CSL-JSON files loaded in addition to the document's bibliography
[bibliography]
files = {files:?}

# Panels shown in the catalog tree, in order: bibliography, doi
[panels]
order = {order:?}

# Logging configuration (RUST_LOG env var overrides)
[logging]
level = "{log_level}"
# Also write JSON logs to this directory
{log_dir}
rotation = "{rotation}"  # hourly, daily, never
"#,
            width = self.size.width,
            height = self.size.height,
            files = files,
            order = self.panel_order,
            log_level = self.logging.level,
            log_dir = log_dir,
            rotation = self.logging.rotation.as_str(),
        )
    }
}
