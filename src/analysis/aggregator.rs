//! Dead-children aggregation by embarkation port.
//!
//! Filters a passenger dataset down to children who did not survive,
//! groups them by port of embarkation and summarizes each group.

use super::error::AggregateError;
use crate::models::{Dataset, SummaryRow, SummaryTable, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Column holding the survival indicator (0 = dead).
pub const SURVIVED_COLUMN: &str = "Survived";
/// Column holding the passenger age.
pub const AGE_COLUMN: &str = "Age";
/// Column holding the embarkation port code.
pub const EMBARKED_COLUMN: &str = "Embarked";

/// Smallest accepted age threshold.
pub const MIN_MAX_AGE: i64 = 1;
/// Largest accepted age threshold.
pub const MAX_MAX_AGE: i64 = 18;

/// Label used for a missing port code and for unmapped port names.
pub const UNKNOWN: &str = "Unknown";

/// Port code to port name.
pub const EMBARKED_PORTS: [(&str, &str); 3] = [
    ("S", "Southampton"),
    ("C", "Cherbourg"),
    ("Q", "Queenstown"),
];

static MISSING: Value = Value::Missing;

/// Resolve a port code to its display name, `"Unknown"` if not mapped.
pub fn embarked_name(code: &str) -> &'static str {
    EMBARKED_PORTS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
        .unwrap_or(UNKNOWN)
}

/// Check that an age threshold lies in `[MIN_MAX_AGE, MAX_MAX_AGE]`.
pub fn validate_max_age(max_age: i64) -> Result<i64, AggregateError> {
    if (MIN_MAX_AGE..=MAX_MAX_AGE).contains(&max_age) {
        Ok(max_age)
    } else {
        Err(invalid_max_age(max_age.to_string()))
    }
}

/// Parse a user-supplied threshold, rejecting anything that is not an integer.
pub fn parse_max_age(raw: &str) -> Result<i64, AggregateError> {
    let trimmed = raw.trim();
    let value = trimmed
        .parse::<i64>()
        .map_err(|_| invalid_max_age(trimmed.to_string()))?;

    validate_max_age(value)
}

fn invalid_max_age(value: String) -> AggregateError {
    AggregateError::InvalidArgument {
        value,
        min: MIN_MAX_AGE,
        max: MAX_MAX_AGE,
    }
}

/// Locate the three required columns, or report every missing one.
fn required_columns(dataset: &Dataset) -> Result<[usize; 3], AggregateError> {
    let names = [SURVIVED_COLUMN, AGE_COLUMN, EMBARKED_COLUMN];
    let found = names.map(|name| dataset.column_index(name));

    let mut missing: Vec<String> = names
        .iter()
        .zip(found.iter())
        .filter(|(_, idx)| idx.is_none())
        .map(|(name, _)| name.to_string())
        .collect();

    if !missing.is_empty() {
        missing.sort();
        return Err(AggregateError::SchemaError { missing });
    }

    Ok(found.map(|idx| idx.unwrap_or_default()))
}

/// Running count and maximum age for one port.
#[derive(Debug, Clone, Copy)]
struct GroupStats {
    count: usize,
    max_age: f64,
}

impl GroupStats {
    fn new(age: f64) -> Self {
        Self {
            count: 1,
            max_age: age,
        }
    }

    fn record(&mut self, age: f64) {
        self.count += 1;
        self.max_age = self.max_age.max(age);
    }
}

/// Count dead children (survived == 0, age <= `max_age`) per embarkation port.
///
/// Rows whose age does not coerce to a number never qualify. A missing
/// port code forms its own group, reported as `"Unknown"`. The result is
/// ordered by count descending, then by port code ascending.
///
/// The dataset is only read; the returned table owns all of its data.
pub fn aggregate(dataset: &Dataset, max_age: i64) -> Result<SummaryTable, AggregateError> {
    let max_age = validate_max_age(max_age)?;
    let [survived_idx, age_idx, embarked_idx] = required_columns(dataset)?;
    let limit = max_age as f64;

    // Missing codes key as None, which keeps them apart from a literal "Unknown" code.
    let mut groups: BTreeMap<Option<String>, GroupStats> = BTreeMap::new();

    for row in &dataset.rows {
        let cell = |idx: usize| row.get(idx).unwrap_or(&MISSING);

        if !cell(survived_idx).is_zero() {
            continue;
        }

        let age = match cell(age_idx).as_number() {
            Some(age) if age <= limit => age,
            _ => continue,
        };

        groups
            .entry(cell(embarked_idx).as_group_key())
            .and_modify(|stats| stats.record(age))
            .or_insert_with(|| GroupStats::new(age));
    }

    if groups.is_empty() {
        debug!(
            "No dead children aged <= {} among {} rows",
            max_age,
            dataset.len()
        );
        return Ok(SummaryTable::empty());
    }

    let mut keyed: Vec<(bool, SummaryRow)> = groups
        .into_iter()
        .map(|(code, stats)| {
            let is_missing = code.is_none();
            let embarked = code.unwrap_or_else(|| UNKNOWN.to_string());
            let embarked_name = embarked_name(&embarked).to_string();
            let row = SummaryRow {
                embarked,
                embarked_name,
                dead_children_count: stats.count,
                max_age_in_group: stats.max_age,
            };
            (is_missing, row)
        })
        .collect();

    // A missing code ties after a literal "Unknown" code.
    keyed.sort_by(|(a_missing, a), (b_missing, b)| {
        b.dead_children_count
            .cmp(&a.dead_children_count)
            .then_with(|| a.embarked.cmp(&b.embarked))
            .then_with(|| a_missing.cmp(b_missing))
    });

    let rows: Vec<SummaryRow> = keyed.into_iter().map(|(_, row)| row).collect();

    debug!(
        "Aggregated {} rows into {} embarkation groups (max_age = {})",
        dataset.len(),
        rows.len(),
        max_age
    );

    Ok(SummaryTable { rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    fn passenger(survived: i64, age: Option<f64>, embarked: Option<&str>) -> Vec<Value> {
        vec![
            Value::Int(survived),
            age.map(Value::Float).unwrap_or(Value::Missing),
            embarked.map(text).unwrap_or(Value::Missing),
        ]
    }

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    /// The seven-row sample used throughout these tests.
    fn create_test_dataset() -> Dataset {
        Dataset::new(
            columns(&["Survived", "Age", "Embarked"]),
            vec![
                passenger(0, Some(5.0), Some("S")),
                passenger(0, Some(17.0), Some("C")),
                passenger(1, Some(10.0), Some("S")),
                passenger(0, Some(19.0), Some("S")),
                passenger(0, None, Some("Q")),
                passenger(0, Some(12.0), Some("Q")),
                passenger(0, Some(18.0), None),
            ],
        )
    }

    fn codes(table: &SummaryTable) -> Vec<&str> {
        table.rows.iter().map(|r| r.embarked.as_str()).collect()
    }

    fn qualifying_rows(dataset: &Dataset, max_age: i64) -> usize {
        dataset
            .rows
            .iter()
            .filter(|row| {
                row[0].is_zero() && row[1].as_number().is_some_and(|a| a <= max_age as f64)
            })
            .count()
    }

    #[test]
    fn test_counts_by_embarked_max_age_18() {
        let table = aggregate(&create_test_dataset(), 18).unwrap();

        assert_eq!(codes(&table), vec!["C", "Q", "S", "Unknown"]);
        assert!(table.rows.iter().all(|r| r.dead_children_count == 1));

        let names: Vec<_> = table.rows.iter().map(|r| r.embarked_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Cherbourg", "Queenstown", "Southampton", "Unknown"]
        );

        assert_eq!(table.row("C").unwrap().max_age_in_group, 17.0);
        assert_eq!(table.row("Q").unwrap().max_age_in_group, 12.0);
        assert_eq!(table.row("S").unwrap().max_age_in_group, 5.0);
        assert_eq!(table.row("Unknown").unwrap().max_age_in_group, 18.0);
    }

    #[test]
    fn test_max_age_filter_is_inclusive() {
        let table = aggregate(&create_test_dataset(), 12).unwrap();

        assert_eq!(codes(&table), vec!["Q", "S"]);
        assert_eq!(table.row("Q").unwrap().max_age_in_group, 12.0);
        assert_eq!(table.row("S").unwrap().max_age_in_group, 5.0);
        assert!(table.row("C").is_none());
        assert_eq!(table.total_count(), 2);
    }

    #[test]
    fn test_invalid_max_age() {
        let dataset = create_test_dataset();

        for bad in [0, 19, -3, i64::MAX] {
            assert!(matches!(
                aggregate(&dataset, bad),
                Err(AggregateError::InvalidArgument { .. })
            ));
        }

        assert!(aggregate(&dataset, 1).is_ok());
        assert!(aggregate(&dataset, 18).is_ok());
    }

    #[test]
    fn test_invalid_max_age_checked_before_schema() {
        let dataset = Dataset::new(columns(&["Name"]), vec![]);
        assert!(matches!(
            aggregate(&dataset, 0),
            Err(AggregateError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_parse_max_age() {
        assert_eq!(parse_max_age("12"), Ok(12));
        assert_eq!(parse_max_age(" 18 "), Ok(18));

        for bad in ["12.5", "abc", "", "0", "19"] {
            assert!(matches!(
                parse_max_age(bad),
                Err(AggregateError::InvalidArgument { .. })
            ));
        }
    }

    #[test]
    fn test_invalid_argument_message_explains_range() {
        let err = aggregate(&create_test_dataset(), 0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "max_age must be an integer in range [1, 18], got 0"
        );
    }

    #[test]
    fn test_missing_embarked_column() {
        let dataset = Dataset::new(
            columns(&["Survived", "Age"]),
            vec![vec![Value::Int(0), Value::Int(5)]],
        );

        let err = aggregate(&dataset, 10).unwrap_err();
        assert_eq!(
            err,
            AggregateError::SchemaError {
                missing: vec!["Embarked".to_string()]
            }
        );
        assert!(err.to_string().contains("Embarked"));
    }

    #[test]
    fn test_missing_columns_are_sorted() {
        let dataset = Dataset::new(columns(&["PassengerId"]), vec![]);

        match aggregate(&dataset, 10) {
            Err(AggregateError::SchemaError { missing }) => {
                assert_eq!(missing, vec!["Age", "Embarked", "Survived"]);
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_no_qualifying_rows_returns_empty_table() {
        let dataset = Dataset::new(
            columns(&["Survived", "Age", "Embarked"]),
            vec![
                passenger(1, Some(5.0), Some("S")),
                passenger(0, Some(40.0), Some("C")),
                passenger(0, None, Some("Q")),
            ],
        );

        let table = aggregate(&dataset, 18).unwrap();
        assert!(table.is_empty());
        assert_eq!(
            table.columns(),
            &["Embarked", "EmbarkedName", "DeadChildrenCount", "MaxAgeInGroup"]
        );
    }

    #[test]
    fn test_extra_columns_and_order_are_tolerated() {
        let dataset = Dataset::new(
            columns(&["Embarked", "Name", "Age", "Pclass", "Survived"]),
            vec![
                vec![text("C"), text("A"), Value::Int(3), Value::Int(3), Value::Int(0)],
                vec![text("C"), text("B"), Value::Int(7), Value::Int(2), Value::Int(0)],
                vec![text("S"), text("C"), Value::Int(2), Value::Int(3), Value::Int(0)],
            ],
        );

        let table = aggregate(&dataset, 10).unwrap();
        assert_eq!(codes(&table), vec!["C", "S"]);
        assert_eq!(table.rows[0].dead_children_count, 2);
        assert_eq!(table.rows[0].max_age_in_group, 7.0);
    }

    #[test]
    fn test_ages_are_coerced() {
        let dataset = Dataset::new(
            columns(&["Survived", "Age", "Embarked"]),
            vec![
                vec![Value::Int(0), text("4"), text("S")],
                vec![Value::Int(0), text("0.42"), text("S")],
                vec![Value::Int(0), text("unknown"), text("S")],
                vec![Value::Int(0), Value::Float(f64::NAN), text("S")],
            ],
        );

        let table = aggregate(&dataset, 5).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0].dead_children_count, 2);
        assert_eq!(table.rows[0].max_age_in_group, 4.0);
    }

    #[test]
    fn test_unmapped_code_keeps_code_but_unknown_name() {
        let dataset = Dataset::new(
            columns(&["Survived", "Age", "Embarked"]),
            vec![passenger(0, Some(3.0), Some("X"))],
        );

        let table = aggregate(&dataset, 5).unwrap();
        assert_eq!(table.rows[0].embarked, "X");
        assert_eq!(table.rows[0].embarked_name, "Unknown");
    }

    #[test]
    fn test_sorted_by_count_then_code() {
        let dataset = Dataset::new(
            columns(&["Survived", "Age", "Embarked"]),
            vec![
                passenger(0, Some(1.0), None),
                passenger(0, Some(2.0), Some("S")),
                passenger(0, Some(3.0), Some("Q")),
                passenger(0, Some(4.0), Some("S")),
                passenger(0, Some(5.0), None),
                passenger(0, Some(6.0), Some("C")),
            ],
        );

        let table = aggregate(&dataset, 10).unwrap();
        assert_eq!(codes(&table), vec!["S", "Unknown", "C", "Q"]);
    }

    #[test]
    fn test_missing_code_sorts_after_literal_unknown_on_tie() {
        let dataset = Dataset::new(
            columns(&["Survived", "Age", "Embarked"]),
            vec![
                passenger(0, Some(3.0), None),
                passenger(0, Some(9.0), Some("Unknown")),
            ],
        );

        let table = aggregate(&dataset, 10).unwrap();
        assert_eq!(codes(&table), vec!["Unknown", "Unknown"]);

        let max_ages: Vec<f64> = table.rows.iter().map(|r| r.max_age_in_group).collect();
        assert_eq!(max_ages, vec![9.0, 3.0]);
    }

    #[test]
    fn test_short_rows_treated_as_missing() {
        let dataset = Dataset::new(
            columns(&["Survived", "Age", "Embarked"]),
            vec![vec![Value::Int(0), Value::Int(8)]],
        );

        let table = aggregate(&dataset, 10).unwrap();
        assert_eq!(codes(&table), vec!["Unknown"]);
    }

    #[test]
    fn test_does_not_mutate_and_is_idempotent() {
        let dataset = create_test_dataset();
        let before = dataset.clone();

        let first = aggregate(&dataset, 15).unwrap();
        let second = aggregate(&dataset, 15).unwrap();

        assert_eq!(first, second);
        assert_eq!(dataset, before);
    }

    #[test]
    fn test_totals_bounds_and_monotonicity() {
        let dataset = create_test_dataset();
        let mut previous_total = 0;

        for max_age in MIN_MAX_AGE..=MAX_MAX_AGE {
            let table = aggregate(&dataset, max_age).unwrap();

            assert_eq!(table.total_count(), qualifying_rows(&dataset, max_age));
            assert!(table.total_count() >= previous_total);
            previous_total = table.total_count();

            for row in &table.rows {
                assert!(row.dead_children_count >= 1);
                assert!(row.max_age_in_group <= max_age as f64);
            }
        }
    }

    #[test]
    fn test_embarked_name_lookup() {
        assert_eq!(embarked_name("S"), "Southampton");
        assert_eq!(embarked_name("C"), "Cherbourg");
        assert_eq!(embarked_name("Q"), "Queenstown");
        assert_eq!(embarked_name("Unknown"), "Unknown");
        assert_eq!(embarked_name("s"), "Unknown");
    }
}
