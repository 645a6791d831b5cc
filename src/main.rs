//! Titanic Lab - dead children by port of embarkation
//!
//! A CLI tool that reads a Titanic passenger CSV, counts the children
//! (up to a chosen age) who did not survive, grouped by port of
//! embarkation, and prints the result as a table.
//!
//! Exit codes:
//!   0 - Success (including an empty result)
//!   1 - Error (unreadable file, bad age, missing columns, config, ...)

mod analysis;
mod cli;
mod config;
mod dataset;
mod models;
mod report;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, CONFIG_FILE_NAME};
use models::{Dataset, Report};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("Titanic Lab v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args) {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default configuration file.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to change the CSV path, maximum age and output format.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so they never mix with a result printed to stdout.
fn init_logging(args: &Args) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the load → aggregate → render workflow. Returns the exit code.
fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let max_age = resolve_max_age(&args, &config)?;
    let csv_path = PathBuf::from(&config.data.csv_path);

    let dataset = load_dataset(&csv_path, config.data.auto_detect_delimiter)
        .with_context(|| format!("Failed to read file `{}`", csv_path.display()))?;
    info!(
        "Loaded {} rows from {}",
        dataset.len(),
        csv_path.display()
    );

    let report = build_report(&config, &csv_path, &dataset, max_age)?;
    if report.rows.is_empty() {
        info!("No dead children aged <= {}", max_age);
    } else {
        info!(
            "{} dead children across {} ports",
            report.metadata.total_dead_children,
            report.rows.len()
        );
    }

    let output = report::generate_report(&report, config.report.format)?;

    match config.general.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write result to {}", path))?;
            println!("✅ Result saved to: {}", path);
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(output.as_bytes())?;
            if !output.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
            stdout.flush()?;
        }
    }

    Ok(0)
}

/// Pick the age threshold: CLI (parsed and checked) over config.
fn resolve_max_age(args: &Args, config: &Config) -> Result<i64> {
    let max_age = match args.max_age {
        Some(ref raw) => analysis::parse_max_age(raw)?,
        None => config.data.max_age,
    };
    debug!("Using max_age = {}", max_age);
    Ok(max_age)
}

fn load_dataset(path: &Path, auto_detect_delimiter: bool) -> Result<Dataset> {
    if auto_detect_delimiter {
        dataset::load_csv_auto_detect(path)
    } else {
        dataset::load_csv(path)
    }
}

/// Aggregate the dataset and wrap the result in a report.
fn build_report(config: &Config, source: &Path, dataset: &Dataset, max_age: i64) -> Result<Report> {
    let table = analysis::aggregate(dataset, max_age).context("Failed to compute result")?;

    let report = Report::new(source.display().to_string(), max_age, dataset, table);

    Ok(if config.report.show_raw {
        report.with_raw_preview(dataset, config.report.raw_rows)
    } else {
        report
    })
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    load_config_in(args, Path::new("."))
}

/// Load configuration, looking for the default file in `dir`.
///
/// A default file that exists but does not parse is an error, not a
/// silent fallback to defaults.
fn load_config_in(args: &Args, dir: &Path) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_from_dir(dir)? {
        Some(config) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        None => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}
