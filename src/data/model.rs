use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::AnalysisError;

// ---------------------------------------------------------------------------
// CellValue – a single cell of a table
// ---------------------------------------------------------------------------

/// A decoded scalar. Every raw catalog or CSV value is mapped onto exactly
/// one of these variants before it enters a [`Table`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    /// Always finite; NaN and infinities decode to `Null`.
    Float(f64),
    Bool(bool),
    /// JSON arrays/objects kept verbatim. They have no usable identity for
    /// cardinality checks.
    Nested(JsonValue),
    Null,
}

impl CellValue {
    /// Decode a JSON scalar from the structured store.
    pub fn from_json(val: &JsonValue) -> Self {
        match val {
            JsonValue::String(s) => CellValue::Text(s.clone()),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    CellValue::Integer(i)
                } else {
                    n.as_f64().map(CellValue::float).unwrap_or(CellValue::Null)
                }
            }
            JsonValue::Bool(b) => CellValue::Bool(*b),
            JsonValue::Null => CellValue::Null,
            other => CellValue::Nested(other.clone()),
        }
    }

    /// Wrap a float, mapping non-finite values to `Null`.
    pub fn float(v: f64) -> Self {
        if v.is_finite() {
            CellValue::Float(v)
        } else {
            CellValue::Null
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Whether the value's own type is numeric (no string parsing).
    pub fn is_number(&self) -> bool {
        matches!(self, CellValue::Integer(_) | CellValue::Float(_))
    }

    /// Numeric coercion: numbers pass through, booleans become 1/0, text is
    /// parsed after trimming, everything else is `None`.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Float(v) => Some(*v),
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            CellValue::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            CellValue::Nested(_) | CellValue::Null => None,
        }
    }

    /// String form used for grouping and export. Floats keep a decimal
    /// point (`2020.0`) so they never collide with integer labels by accident.
    pub fn label(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Float(v) => format!("{v:?}"),
            CellValue::Bool(b) => (if *b { "True" } else { "False" }).to_string(),
            CellValue::Nested(v) => v.to_string(),
            CellValue::Null => "None".to_string(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v:.4}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Nested(v) => write!(f, "{v}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

// ---------------------------------------------------------------------------
// Table – the materialized resource
// ---------------------------------------------------------------------------

/// One JSON record as returned by the structured store.
pub type Record = serde_json::Map<String, JsonValue>;

/// Row-major table. Every row holds exactly one cell per column, in column
/// order, so all rows share the same column set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// Build a table, rejecting repeated column names and rows whose width
    /// differs from the header.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Result<Self, AnalysisError> {
        let mut seen = HashSet::new();
        if let Some(dup) = columns.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(AnalysisError::DuplicateColumn(dup.clone()));
        }
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(AnalysisError::RowWidth {
                row: index,
                expected: columns.len(),
                found: row.len(),
            });
        }
        Ok(Table { columns, rows })
    }

    /// Convert structured-store records. Columns are ordered by first
    /// appearance; keys absent from a record become `Null`.
    pub fn from_records(records: &[Record]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for rec in records {
            for key in rec.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .iter()
            .map(|rec| {
                columns
                    .iter()
                    .map(|col| rec.get(col).map(CellValue::from_json).unwrap_or(CellValue::Null))
                    .collect()
            })
            .collect();

        Table { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize, AnalysisError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| AnalysisError::UnknownColumn(name.to_string()))
    }

    /// All cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &CellValue> + '_, AnalysisError> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(move |row| &row[idx]))
    }

    /// First `n` rows, same columns.
    pub fn head(&self, n: usize) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Keep the rows for which `keep` returns a replacement row.
    pub(crate) fn filter_map_rows<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&[CellValue]) -> Option<Vec<CellValue>>,
    {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter_map(|row| keep(row)).collect(),
        }
    }
}
