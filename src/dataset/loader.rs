//! CSV loading.
//!
//! Reads a passenger CSV file into a [`Dataset`], inferring a type for
//! every cell. Malformed files are reported here; the aggregator never
//! sees them.

use crate::models::{Dataset, Value};
use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::path::Path;
use tracing::{debug, warn};

/// CSV reader settings.
#[derive(Debug, Clone)]
pub struct CsvLoader {
    /// Field delimiter (default: comma).
    delimiter: u8,
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self {
            delimiter: b',',
        }
    }
}

impl CsvLoader {
    /// Create a loader with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Load a dataset from a CSV file.
    pub fn load_file(&self, path: &Path) -> Result<Dataset> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read CSV file: {}", path.display()))?;

        // Non-UTF-8 input is decoded lossily rather than rejected.
        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(e) => {
                warn!("{} is not valid UTF-8, decoding lossily", path.display());
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };

        let dataset = self
            .parse_content(&content)
            .with_context(|| format!("Failed to parse CSV file: {}", path.display()))?;

        debug!(
            "Loaded {} rows x {} columns from {}",
            dataset.len(),
            dataset.columns.len(),
            path.display()
        );

        Ok(dataset)
    }

    /// Parse CSV content held in memory.
    pub fn parse_content(&self, content: &str) -> Result<Dataset> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(Trim::All)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers = reader
            .headers()
            .context("Failed to read CSV headers")?
            .clone();

        if headers.is_empty() {
            anyhow::bail!("CSV has no header row");
        }

        let columns: Vec<String> = headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut rows = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let record =
                result.with_context(|| format!("Failed to parse CSV row {}", index + 1))?;
            rows.push(parse_row(index, columns.len(), &record));
        }

        Ok(Dataset::new(columns, rows))
    }
}

/// Convert one record into typed cells aligned with the header.
fn parse_row(index: usize, width: usize, record: &StringRecord) -> Vec<Value> {
    if record.len() > width {
        warn!(
            "Row {} has {} fields but the header has {}; extra fields dropped",
            index + 1,
            record.len(),
            width
        );
    }

    (0..width)
        .map(|idx| record.get(idx).map(Value::infer).unwrap_or(Value::Missing))
        .collect()
}

/// Load a dataset from a comma-separated file with default settings.
pub fn load_csv(path: &Path) -> Result<Dataset> {
    CsvLoader::default().load_file(path)
}

/// Detect the delimiter from the first lines (comma, semicolon, tab, pipe).
pub fn detect_delimiter(content: &str) -> u8 {
    let sample: Vec<&str> = content.lines().take(10).collect();
    if sample.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0.0f32;

    for delimiter in [b',', b';', b'\t', b'|'] {
        let counts: Vec<f32> = sample
            .iter()
            .map(|line| line.bytes().filter(|&b| b == delimiter).count() as f32)
            .collect();

        let avg = counts.iter().sum::<f32>() / counts.len() as f32;
        let variance = counts.iter().map(|c| (c - avg).powi(2)).sum::<f32>() / counts.len() as f32;
        // Frequent and consistent across lines wins.
        let score = avg / (1.0 + variance.sqrt());

        if score > best_score {
            best_score = score;
            best = delimiter;
        }
    }

    best
}

/// Load a CSV file, guessing its delimiter first.
pub fn load_csv_auto_detect(path: &Path) -> Result<Dataset> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read CSV file: {}", path.display()))?;
    let sample = String::from_utf8_lossy(&bytes[..bytes.len().min(4096)]);

    let delimiter = detect_delimiter(&sample);
    debug!("Detected delimiter {:?}", delimiter as char);

    CsvLoader::new().with_delimiter(delimiter).load_file(path)
}
