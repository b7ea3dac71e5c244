use std::collections::HashSet;
use std::ops::RangeInclusive;

use serde::Serialize;

use super::model::{CellValue, Table};

/// Distinct non-null value counts that qualify a column as categorical.
pub const CATEGORICAL_CARDINALITY: RangeInclusive<usize> = 2..=60;

// ---------------------------------------------------------------------------
// Cardinality check
// ---------------------------------------------------------------------------

/// A column left out of the categorical candidates because its distinct
/// values cannot be counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationSkip {
    pub column: String,
    pub reason: &'static str,
}

/// Hashable identity of a cell for distinct counting.
#[derive(Debug, PartialEq, Eq, Hash)]
enum DistinctKey<'a> {
    Text(&'a str),
    Integer(i64),
    Float(u64),
    Bool(bool),
}

fn distinct_key(value: &CellValue) -> Option<Result<DistinctKey<'_>, &'static str>> {
    match value {
        CellValue::Null => None,
        CellValue::Text(s) => Some(Ok(DistinctKey::Text(s))),
        CellValue::Integer(i) => Some(Ok(DistinctKey::Integer(*i))),
        // 2 and 2.0 are the same value.
        CellValue::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            Some(Ok(DistinctKey::Integer(*f as i64)))
        }
        CellValue::Float(f) => Some(Ok(DistinctKey::Float(f.to_bits()))),
        CellValue::Bool(b) => Some(Ok(DistinctKey::Bool(*b))),
        CellValue::Nested(_) => Some(Err("nested values have no distinct identity")),
    }
}

/// Count distinct non-null values of `column`.
pub fn distinct_count(table: &Table, column: &str) -> Result<usize, ClassificationSkip> {
    let skip = |reason| ClassificationSkip {
        column: column.to_string(),
        reason,
    };
    let cells = table.column(column).map_err(|_| skip("column not found"))?;

    let mut seen = HashSet::new();
    for cell in cells {
        match distinct_key(cell) {
            Some(Ok(key)) => {
                seen.insert(key);
            }
            Some(Err(reason)) => return Err(skip(reason)),
            None => {}
        }
    }
    Ok(seen.len())
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Column classifications and data-quality counters of one table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Profile {
    pub rows: usize,
    pub columns: usize,
    /// Null cells summed over all columns.
    pub null_cells: usize,
    /// Columns whose non-null values are all numbers, in table order.
    pub numeric: Vec<String>,
    /// Low-cardinality columns, in table order. May overlap `numeric`.
    pub categorical: Vec<String>,
}

impl Profile {
    pub fn numeric_count(&self) -> usize {
        self.numeric.len()
    }

    pub fn categorical_count(&self) -> usize {
        self.categorical.len()
    }
}

/// A column is numeric when it has at least one value and every non-null
/// value is a number by type.
pub fn is_numeric(table: &Table, column: &str) -> bool {
    let Ok(cells) = table.column(column) else {
        return false;
    };
    let mut any = false;
    for cell in cells {
        if cell.is_null() {
            continue;
        }
        if !cell.is_number() {
            return false;
        }
        any = true;
    }
    any
}

/// Low-cardinality columns of `table`. Columns whose cardinality check is
/// skipped are left out and logged.
pub fn categorical_candidates(table: &Table) -> Vec<String> {
    table
        .columns()
        .iter()
        .filter(|col| match distinct_count(table, col) {
            Ok(n) => CATEGORICAL_CARDINALITY.contains(&n),
            Err(skip) => {
                log::debug!("Skipping '{}' as a category: {}", skip.column, skip.reason);
                false
            }
        })
        .cloned()
        .collect()
}

pub fn classify(table: &Table) -> Profile {
    let null_cells = table
        .rows()
        .iter()
        .flat_map(|row| row.iter())
        .filter(|cell| cell.is_null())
        .count();

    let numeric = table
        .columns()
        .iter()
        .filter(|col| is_numeric(table, col))
        .cloned()
        .collect();

    Profile {
        rows: table.len(),
        columns: table.columns().len(),
        null_cells,
        numeric,
        categorical: categorical_candidates(table),
    }
}
