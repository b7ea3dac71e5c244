use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use super::filter::Series;
use super::model::Table;
use super::profile::is_numeric;
use crate::error::AnalysisError;

/// Number of categories kept by [`aggregate`].
pub const TOP_N: usize = 15;

// ---------------------------------------------------------------------------
// Descriptive statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quartiles {
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub sum: f64,
    pub mean: f64,
    pub median: f64,
    pub p90: f64,
    pub max: f64,
    pub min: f64,
    /// Sample standard deviation (n - 1); 0 for a single value.
    pub std: f64,
    pub quartiles: Quartiles,
}

/// Quantile `q` in `[0, 1]` of ascending `sorted`, interpolating linearly
/// between the closest ranks.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let rank = q.clamp(0.0, 1.0) * (sorted.len() as f64 - 1.0);
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let w = rank - lo as f64;
        sorted[lo] + (sorted[hi] - sorted[lo]) * w
    }
}

pub fn describe(series: &Series) -> Result<DescriptiveStats, AnalysisError> {
    if series.is_empty() {
        return Err(AnalysisError::EmptySeries {
            column: series.column.clone(),
        });
    }

    let mut sorted = series.values.clone();
    sorted.sort_by(f64::total_cmp);

    let count = sorted.len();
    let sum: f64 = sorted.iter().sum();
    let mean = sum / count as f64;
    let std = if count > 1 {
        let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (count - 1) as f64).sqrt()
    } else {
        0.0
    };

    let median = quantile_sorted(&sorted, 0.5);
    Ok(DescriptiveStats {
        count,
        sum,
        mean,
        median,
        p90: quantile_sorted(&sorted, 0.9),
        max: sorted[count - 1],
        min: sorted[0],
        std,
        quartiles: Quartiles {
            q25: quantile_sorted(&sorted, 0.25),
            q50: median,
            q75: quantile_sorted(&sorted, 0.75),
        },
    })
}

// ---------------------------------------------------------------------------
// Grouped aggregates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum AggregateMode {
    #[default]
    Sum,
    Mean,
    Count,
}

impl AggregateMode {
    pub const ALL: [AggregateMode; 3] = [AggregateMode::Sum, AggregateMode::Mean, AggregateMode::Count];

    /// Axis label for charts.
    pub fn axis_label(&self) -> &'static str {
        match self {
            AggregateMode::Sum => "Sum (production)",
            AggregateMode::Mean => "Mean",
            AggregateMode::Count => "Count (records)",
        }
    }
}

impl fmt::Display for AggregateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AggregateMode::Sum => "Sum",
            AggregateMode::Mean => "Mean",
            AggregateMode::Count => "Count",
        };
        write!(f, "{name}")
    }
}

/// Category label → reduced value, descending, at most [`TOP_N`] entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub value_column: String,
    pub category_column: String,
    pub mode: AggregateMode,
    pub entries: Vec<(String, f64)>,
}

#[derive(Default)]
struct Group {
    sum: f64,
    count: usize,
}

/// Group `table` by the string form of `category_column` and reduce the
/// numeric `value_column` per group.
///
/// `table` is expected to be the range-filtered table. Rows whose value
/// does not coerce to a number contribute to no group's sum, mean, or count.
/// Equal results keep the order in which their categories first appear.
/// Missing categories group under `nan` in numeric columns and `None`
/// otherwise.
pub fn aggregate(
    table: &Table,
    value_column: &str,
    category_column: &str,
    mode: AggregateMode,
) -> Result<AggregateResult, AnalysisError> {
    let value_idx = table.column_index(value_column)?;
    let category_idx = table.column_index(category_column)?;
    let null_label = if is_numeric(table, category_column) { "nan" } else { "None" };

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Group> = HashMap::new();

    for row in table.rows() {
        let cell = &row[category_idx];
        let label = if cell.is_null() { null_label.to_string() } else { cell.label() };
        let group = groups.entry(label.clone()).or_insert_with(|| {
            order.push(label);
            Group::default()
        });
        if let Some(v) = row[value_idx].to_f64() {
            group.sum += v;
            group.count += 1;
        }
    }

    let mut entries: Vec<(String, f64)> = order
        .into_iter()
        .map(|label| {
            let g = &groups[&label];
            let value = match mode {
                AggregateMode::Sum => g.sum,
                AggregateMode::Mean if g.count == 0 => f64::NAN,
                AggregateMode::Mean => g.sum / g.count as f64,
                AggregateMode::Count => g.count as f64,
            };
            (label, value)
        })
        .collect();

    // Stable: ties keep first-appearance order. NaN means sort last.
    entries.sort_by(|a, b| match (a.1.is_nan(), b.1.is_nan()) {
        (false, false) => b.1.total_cmp(&a.1),
        (nan_a, nan_b) => nan_a.cmp(&nan_b),
    });
    entries.truncate(TOP_N);

    Ok(AggregateResult {
        value_column: value_column.to_string(),
        category_column: category_column.to_string(),
        mode,
        entries,
    })
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

/// One equal-width bin `[start, end)`; the last bin also includes `end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Equal-width histogram over `[min, max]` of the series. A zero-width
/// range collapses into a single bin.
pub fn histogram(series: &Series, bins: usize) -> Vec<Bin> {
    let (Some(min), Some(max)) = (series.min(), series.max()) else {
        return Vec::new();
    };
    if bins == 0 {
        return Vec::new();
    }
    if max <= min {
        return vec![Bin {
            start: min - 0.5,
            end: max + 0.5,
            count: series.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut out: Vec<Bin> = (0..bins)
        .map(|i| Bin {
            start: min + width * i as f64,
            end: min + width * (i + 1) as f64,
            count: 0,
        })
        .collect();
    for &v in &series.values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}
