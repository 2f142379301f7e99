use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use engine_logging::LogDestination;
use ocr_engine::ServiceConfig;
use serde::{Deserialize, Serialize};

use super::cli::Cli;

const CONFIG_FILENAME: &str = "ocr_client.ron";

/// Settings read once at startup. Every field has a default, so an empty
/// file or no file at all is valid.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub destination: LogTarget,
    /// Log file used for `File` and `Both`; defaults to `./ocr_client.log`.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            destination: LogTarget::Terminal,
            file: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogTarget {
    #[default]
    Terminal,
    File,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File => LogDestination::File,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

impl AppConfig {
    /// Loads `path`, or `./ocr_client.ron` when no path is given and it exists.
    /// The file `load` reads: the explicit path, else `CONFIG_FILENAME`
    /// in the working directory if present.
    pub fn locate(path: Option<&Path>) -> Option<PathBuf> {
        match path {
            Some(path) => Some(path.to_path_buf()),
            None => {
                let default_path = PathBuf::from(CONFIG_FILENAME);
                default_path.is_file().then_some(default_path)
            }
        }
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        match Self::locate(path) {
            Some(path) => Self::read(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn parse(text: &str) -> Result<Self> {
        ron::from_str(text).context("invalid RON config")
    }

    /// Applies command-line overrides and validates the service endpoint.
    pub fn with_overrides(mut self, cli: &Cli) -> Result<Self> {
        if let Some(base_url) = &cli.base_url {
            self.service.base_url = base_url.clone();
        }
        if cli.verbose {
            self.logging.level = "debug".to_string();
        }
        self.service.validate()?;
        Ok(self)
    }

    pub fn init_logging(&self) {
        engine_logging::initialize(
            engine_logging::parse_level(&self.logging.level),
            self.logging.destination.into(),
            self.logging.file.as_deref(),
        );
    }

    fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("in {}", path.display()))
    }
}
