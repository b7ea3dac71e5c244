use serde::Serialize;

use super::model::{CellValue, Table};
use crate::error::AnalysisError;

// ---------------------------------------------------------------------------
// Series – non-null numeric values of one column
// ---------------------------------------------------------------------------

/// Numeric values of one column in row order, nulls dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub column: String,
    pub values: Vec<f64>,
}

impl Series {
    pub fn new(column: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            column: column.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn min(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }

    /// `(min, max)`, or `EmptySeries` when there are no values.
    pub fn bounds(&self) -> Result<(f64, f64), AnalysisError> {
        match (self.min(), self.max()) {
            (Some(lo), Some(hi)) => Ok((lo, hi)),
            _ => Err(AnalysisError::EmptySeries {
                column: self.column.clone(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Range filter
// ---------------------------------------------------------------------------

/// Inclusive `[lo, hi]` bounds. `hi < lo` is allowed and matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RangeFilter {
    pub lo: f64,
    pub hi: f64,
}

impl RangeFilter {
    pub fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    /// Full bounds of `series`.
    pub fn spanning(series: &Series) -> Result<Self, AnalysisError> {
        let (lo, hi) = series.bounds()?;
        Ok(Self { lo, hi })
    }

    pub fn contains(&self, v: f64) -> bool {
        self.lo <= v && v <= self.hi
    }
}

/// Coerce `column` to numbers, keeping `None` for unparseable cells.
pub fn coerce_column(table: &Table, column: &str) -> Result<Vec<Option<f64>>, AnalysisError> {
    Ok(table.column(column)?.map(CellValue::to_f64).collect())
}

/// Coerce `column` to numbers and drop nulls.
///
/// Fails with `EmptySeries` when no value survives.
pub fn prepare(table: &Table, column: &str) -> Result<Series, AnalysisError> {
    let values: Vec<f64> = coerce_column(table, column)?.into_iter().flatten().collect();
    if values.is_empty() {
        return Err(AnalysisError::EmptySeries {
            column: column.to_string(),
        });
    }
    Ok(Series::new(column, values))
}

/// Values of `series` inside `range`, order preserved. May be empty.
pub fn filter_range(series: &Series, range: RangeFilter) -> Series {
    Series::new(
        series.column.clone(),
        series.values.iter().copied().filter(|&v| range.contains(v)).collect(),
    )
}

/// Rows of `table` whose coerced `column` lies in `range`.
///
/// The kept rows carry the coerced number in `column`, so downstream
/// grouping and export see the same values the statistics did.
pub fn filter_table(table: &Table, column: &str, range: RangeFilter) -> Result<Table, AnalysisError> {
    let idx = table.column_index(column)?;
    Ok(table.filter_map_rows(|row| {
        let v = row[idx].to_f64().filter(|&v| range.contains(v))?;
        let mut kept = row.to_vec();
        kept[idx] = match row[idx] {
            CellValue::Integer(i) => CellValue::Integer(i),
            _ => CellValue::Float(v),
        };
        Some(kept)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Record;
    use serde_json::json;

    fn table(value: serde_json::Value) -> Table {
        let recs: Vec<Record> = value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect();
        Table::from_records(&recs)
    }

    #[test]
    fn prepare_drops_unparseable_and_null_values() {
        let t = table(json!([
            {"egresos": 10}, {"egresos": 20}, {"egresos": 30}, {"egresos": "bad"}, {"egresos": null}
        ]));
        let s = prepare(&t, "egresos").unwrap();
        assert_eq!(s.values, [10.0, 20.0, 30.0]);
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn prepare_fails_only_when_nothing_is_numeric() {
        let t = table(json!([{"egresos": "bad"}, {"egresos": null}]));
        assert_eq!(
            prepare(&t, "egresos"),
            Err(AnalysisError::EmptySeries { column: "egresos".into() })
        );

        let t = table(json!([{"egresos": "bad"}, {"egresos": "7"}]));
        assert_eq!(prepare(&t, "egresos").unwrap().values, [7.0]);
    }

    #[test]
    fn full_bounds_are_identity() {
        let s = Series::new("v", vec![5.0, -1.0, 3.0, 9.5, 3.0]);
        let range = RangeFilter::spanning(&s).unwrap();
        assert_eq!(range, RangeFilter::new(-1.0, 9.5));
        assert_eq!(filter_range(&s, range), s);
    }

    #[test]
    fn bounds_are_inclusive_and_inverted_ranges_are_empty() {
        let s = Series::new("v", vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(filter_range(&s, RangeFilter::new(2.0, 3.0)).values, [2.0, 3.0]);
        assert!(filter_range(&s, RangeFilter::new(3.0, 2.0)).is_empty());
    }

    #[test]
    fn filter_table_keeps_coerced_values_and_column_order() {
        let t = table(json!([
            {"region": "Maule", "egresos": "15"},
            {"region": "Ñuble", "egresos": 40},
            {"region": "Biobío", "egresos": "bad"},
            {"region": "Aysén", "egresos": 5}
        ]));
        let f = filter_table(&t, "egresos", RangeFilter::new(10.0, 40.0)).unwrap();

        assert_eq!(f.columns(), t.columns());
        assert_eq!(f.len(), 2);
        assert_eq!(f.rows()[0][1], CellValue::Float(15.0));
        assert_eq!(f.rows()[1][1], CellValue::Integer(40));
    }

    #[test]
    fn unknown_column_is_an_error() {
        let t = table(json!([{"a": 1}]));
        assert!(matches!(prepare(&t, "b"), Err(AnalysisError::UnknownColumn(_))));
    }
}
