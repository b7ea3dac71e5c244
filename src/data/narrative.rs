use std::fmt;

use serde::Serialize;

use super::filter::Series;
use super::stats::{describe, DescriptiveStats};
use crate::error::AnalysisError;

/// Direction of the distribution's tail, from mean vs. median.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Skew {
    /// Mean above median: tail to the right.
    Positive,
    /// Mean below median: tail to the left.
    Negative,
    Symmetric,
}

impl Skew {
    pub fn from_stats(stats: &DescriptiveStats) -> Self {
        if stats.mean > stats.median {
            Skew::Positive
        } else if stats.mean < stats.median {
            Skew::Negative
        } else {
            Skew::Symmetric
        }
    }
}

impl fmt::Display for Skew {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Skew::Positive => write!(f, "positive (right tail)"),
            Skew::Negative => write!(f, "negative (left tail)"),
            Skew::Symmetric => write!(f, "approximately symmetric"),
        }
    }
}

pub fn skew(series: &Series) -> Result<Skew, AnalysisError> {
    describe(series).map(|stats| Skew::from_stats(&stats))
}

/// Thousands-separated number with two decimals, e.g. `12,345.60`.
pub fn format_number(v: f64) -> String {
    if !v.is_finite() {
        return v.to_string();
    }
    let fixed = format!("{:.2}", v.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if v < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

/// Three-line plain-language reading of the filtered indicator.
pub fn conclusion(column: &str, stats: &DescriptiveStats) -> Vec<String> {
    vec![
        format!(
            "For the indicator {column}, total production (sum) in the filtered range is {}.",
            format_number(stats.sum)
        ),
        format!(
            "The mean is {} and the median is {}, which suggests a {} distribution.",
            format_number(stats.mean),
            format_number(stats.median),
            Skew::from_stats(stats)
        ),
        format!(
            "The 90th percentile (P90) is {}, useful to spot the high values that concentrate production.",
            format_number(stats.p90)
        ),
    ]
}
