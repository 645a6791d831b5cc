//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.titanic-lab.toml` files.

use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = ".titanic-lab.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Dataset settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Write the result to this file instead of stdout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// Dataset settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to the passenger CSV.
    #[serde(default = "default_csv_path")]
    pub csv_path: String,

    /// Maximum child age (1 to 18).
    #[serde(default = "default_max_age")]
    pub max_age: i64,

    /// Guess the delimiter instead of assuming a comma.
    #[serde(default)]
    pub auto_detect_delimiter: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
            max_age: default_max_age(),
            auto_detect_delimiter: false,
        }
    }
}

fn default_csv_path() -> String {
    "titanic_train.csv".to_string()
}

fn default_max_age() -> i64 {
    12
}

/// Report rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Show the first rows of the raw data.
    #[serde(default)]
    pub show_raw: bool,

    /// How many raw rows to show.
    #[serde(default = "default_raw_rows")]
    pub raw_rows: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            show_raw: false,
            raw_rows: default_raw_rows(),
        }
    }
}

fn default_raw_rows() -> usize {
    20
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load `.titanic-lab.toml` from a directory.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// where they were given explicitly. The age threshold is resolved
    /// separately because it has to be parsed and validated.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref csv) = args.csv {
            self.data.csv_path = csv.to_string_lossy().into_owned();
        }
        if args.auto_delimiter {
            self.data.auto_detect_delimiter = true;
        }

        if let Some(format) = args.format {
            self.report.format = format;
        }
        if args.show_raw {
            self.report.show_raw = true;
        }
        if let Some(raw_rows) = args.raw_rows {
            self.report.raw_rows = raw_rows;
        }

        if let Some(ref output) = args.output {
            self.general.output = Some(output.to_string_lossy().into_owned());
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
