//! Data models for the passenger analysis.
//!
//! This module contains the core data structures used throughout
//! the application: the loaded dataset, its cells, the summary table
//! produced by the aggregator and the report wrapped around it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tokens a CSV reader treats as "no value".
const MISSING_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "<NA>", "#N/A",
];

/// A single cell of the dataset.
///
/// Cells are typed on load the way a dataframe reader infers them, so
/// numeric columns compare numerically and missing values stay explicit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// No value (empty cell or a recognised NA token).
    Missing,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Infer a typed value from a raw CSV field.
    pub fn infer(raw: &str) -> Self {
        let raw = raw.trim();

        if MISSING_TOKENS.contains(&raw) {
            return Value::Missing;
        }

        match raw {
            "True" | "TRUE" | "true" => return Value::Bool(true),
            "False" | "FALSE" | "false" => return Value::Bool(false),
            _ => {}
        }

        if let Ok(i) = raw.parse::<i64>() {
            return Value::Int(i);
        }

        if let Ok(f) = raw.parse::<f64>() {
            return if f.is_nan() {
                Value::Missing
            } else {
                Value::Float(f)
            };
        }

        Value::Text(raw.to_string())
    }

    /// Whether this cell holds no value.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Coerce the cell to a number.
    ///
    /// Text is parsed leniently; anything that does not parse, and any
    /// missing cell, yields `None` instead of an error.
    pub fn as_number(&self) -> Option<f64> {
        let number = match self {
            Value::Missing => return None,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Int(i) => *i as f64,
            Value::Float(f) => *f,
            Value::Text(s) => s.trim().parse::<f64>().ok()?,
        };

        (!number.is_nan()).then_some(number)
    }

    /// Numeric equality with zero. Text never equals zero.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Bool(b) => !*b,
            Value::Int(i) => *i == 0,
            Value::Float(f) => *f == 0.0,
            Value::Missing | Value::Text(_) => false,
        }
    }

    /// The grouping key of this cell, `None` when missing.
    pub fn as_group_key(&self) -> Option<String> {
        if self.is_missing() {
            None
        } else {
            Some(self.to_string())
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => write!(f, "NaN"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", format_number(*v)),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Format a float with at least one decimal place (`5` -> `5.0`, `0.42` -> `0.42`).
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// An in-memory table of passenger records, columns addressed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Column names in file order.
    pub columns: Vec<String>,
    /// Rows, each aligned with `columns`.
    pub rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Creates a dataset from column names and rows.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Position of the first column with exactly this name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// The first `n` rows with every column, as a new dataset.
    pub fn head(&self, n: usize) -> Dataset {
        Dataset {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }
}

/// One embarkation group in the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SummaryRow {
    /// Port code, or `"Unknown"` when the code was missing.
    pub embarked: String,
    /// Human-readable port name.
    pub embarked_name: String,
    /// Number of dead children in the group (always at least 1).
    pub dead_children_count: usize,
    /// Oldest qualifying age in the group.
    pub max_age_in_group: f64,
}

/// The aggregation result: a fixed four-column table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryTable {
    pub rows: Vec<SummaryRow>,
}

impl SummaryTable {
    /// Output column names, present even when there are no rows.
    pub const COLUMNS: [&'static str; 4] =
        ["Embarked", "EmbarkedName", "DeadChildrenCount", "MaxAgeInGroup"];

    /// Creates an empty table.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sum of the per-group counts.
    pub fn total_count(&self) -> usize {
        self.rows.iter().map(|r| r.dead_children_count).sum()
    }
}

#[cfg(test)]
impl SummaryTable {
    pub fn columns(&self) -> &'static [&'static str] {
        &Self::COLUMNS
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Looks up the row for a port code.
    pub fn row(&self, embarked: &str) -> Option<&SummaryRow> {
        self.rows.iter().find(|r| r.embarked == embarked)
    }
}

/// Metadata about a report run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Where the dataset came from.
    pub source: String,
    /// Maximum child age used for the filter.
    pub max_age: i64,
    /// Number of rows in the loaded dataset.
    pub rows_read: usize,
    /// Sum of the per-port counts.
    pub total_dead_children: usize,
    /// Time the report was generated.
    pub generated_at: DateTime<Utc>,
}

/// A complete report: the summary plus optional raw preview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    /// Always the four summary column names.
    pub columns: Vec<String>,
    pub rows: Vec<SummaryRow>,
    /// First rows of the input, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_preview: Option<Dataset>,
}

impl Report {
    /// Builds a report from an aggregation result.
    pub fn new(source: String, max_age: i64, dataset: &Dataset, table: SummaryTable) -> Self {
        let metadata = ReportMetadata {
            source,
            max_age,
            rows_read: dataset.len(),
            total_dead_children: table.total_count(),
            generated_at: Utc::now(),
        };

        Self {
            metadata,
            columns: SummaryTable::COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: table.rows,
            raw_preview: None,
        }
    }

    /// Attach the first `n` rows of the dataset as a preview.
    pub fn with_raw_preview(mut self, dataset: &Dataset, n: usize) -> Self {
        self.raw_preview = Some(dataset.head(n));
        self
    }
}
