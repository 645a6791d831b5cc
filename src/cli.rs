//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Titanic Lab - dead children by port of embarkation
///
/// Reads a Titanic passenger CSV and counts the passengers who did not
/// survive and were at most --max-age years old, grouped by the port
/// where they embarked.
///
/// Examples:
///   titanic-lab --csv titanic_train.csv
///   titanic-lab --csv titanic_train.csv --max-age 5 --show-raw
///   titanic-lab --csv titanic_train.csv --format json --output result.json
///   titanic-lab --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to the passenger CSV file
    ///
    /// Must contain the Survived, Age and Embarked columns.
    /// Default: from config or titanic_train.csv.
    #[arg(long, value_name = "FILE", env = "TITANIC_LAB_CSV")]
    pub csv: Option<PathBuf>,

    /// Maximum child age, an integer from 1 to 18 (inclusive)
    ///
    /// Default: from config or 12.
    #[arg(
        short = 'a',
        long,
        value_name = "AGE",
        env = "TITANIC_LAB_MAX_AGE",
        allow_hyphen_values = true
    )]
    pub max_age: Option<String>,

    /// Show the first rows of the raw dataset before the result
    #[arg(long)]
    pub show_raw: bool,

    /// Number of raw rows to show with --show-raw
    #[arg(long, value_name = "COUNT")]
    pub raw_rows: Option<usize>,

    /// Guess the CSV delimiter (comma, semicolon, tab, pipe)
    #[arg(long)]
    pub auto_delimiter: bool,

    /// Output format (table, markdown, json)
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write the result to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .titanic-lab.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .titanic-lab.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the result.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Aligned plain-text table (default)
    #[default]
    Table,
    /// Markdown document
    Markdown,
    /// JSON document
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    ///
    /// The age threshold is validated by the aggregator itself.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if let Some(ref csv) = self.csv {
            if csv.as_os_str().is_empty() {
                return Err("CSV path must not be empty".to_string());
            }
        }

        if self.raw_rows == Some(0) {
            return Err("Raw rows must be at least 1".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref output) = self.output {
            if output.is_dir() {
                return Err(format!(
                    "Output path is a directory: {}",
                    output.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
