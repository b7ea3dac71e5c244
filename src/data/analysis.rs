use serde::Serialize;

use super::filter::{filter_range, filter_table, prepare, RangeFilter, Series};
use super::model::Table;
use super::narrative::Skew;
use super::profile::categorical_candidates;
use super::stats::{describe, DescriptiveStats};
use crate::error::AnalysisError;

/// Everything derived from one (table, column, range) selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub column: String,
    pub range: RangeFilter,
    /// Rows of the source table inside the range.
    pub filtered: Table,
    pub series: Series,
    pub stats: DescriptiveStats,
    pub skew: Skew,
    /// Low-cardinality columns of `filtered`, excluding `column`.
    pub categories: Vec<String>,
}

impl Analysis {
    /// Recompute from scratch. Fails with `EmptySeries` when the column has
    /// no numbers or the range excludes all of them.
    pub fn compute(table: &Table, column: &str, range: RangeFilter) -> Result<Self, AnalysisError> {
        let series = filter_range(&prepare(table, column)?, range);
        let stats = describe(&series)?;
        let filtered = filter_table(table, column, range)?;

        let categories = categorical_candidates(&filtered)
            .into_iter()
            .filter(|c| c != column)
            .collect();

        log::debug!(
            "'{column}' in [{}, {}]: {} of {} rows",
            range.lo,
            range.hi,
            filtered.len(),
            table.len()
        );

        Ok(Analysis {
            column: column.to_string(),
            range,
            filtered,
            series,
            skew: Skew::from_stats(&stats),
            stats,
            categories,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Record;
    use serde_json::json;

    fn table() -> Table {
        let recs: Vec<Record> = json!([
            {"region": "Maule", "egresos": 10},
            {"region": "Ñuble", "egresos": 20},
            {"region": "Maule", "egresos": 30},
            {"region": "Aysén", "egresos": "bad"},
            {"region": "Aysén", "egresos": null}
        ])
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_object().unwrap().clone())
        .collect();
        Table::from_records(&recs)
    }

    #[test]
    fn series_and_filtered_table_agree() {
        let a = Analysis::compute(&table(), "egresos", RangeFilter::new(15.0, 30.0)).unwrap();
        assert_eq!(a.series.values, [20.0, 30.0]);
        assert_eq!(a.filtered.len(), a.series.len());
        assert_eq!(a.stats.sum, 50.0);
        assert_eq!(a.categories, ["region"]);
    }

    #[test]
    fn range_that_excludes_everything_is_empty_series() {
        let err = Analysis::compute(&table(), "egresos", RangeFilter::new(40.0, 10.0)).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptySeries { .. }));
    }
}
