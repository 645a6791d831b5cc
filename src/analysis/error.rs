//! Errors reported by the aggregator.

use thiserror::Error;

/// Recoverable failures of [`super::aggregate`].
///
/// Both are meant to be shown to the user, not to abort the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateError {
    /// The age threshold is not an integer or is out of range.
    #[error("max_age must be an integer in range [{min}, {max}], got {value}")]
    InvalidArgument { value: String, min: i64, max: i64 },

    /// Required columns are absent from the dataset (sorted by name).
    #[error("Missing required columns: {}", .missing.join(", "))]
    SchemaError { missing: Vec<String> },
}
