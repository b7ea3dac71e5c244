use std::ops::RangeInclusive;
use std::str::FromStr;
use std::time::Duration;

pub const SEARCH_ROWS_RANGE: RangeInclusive<usize> = 5..=30;
pub const ROW_LIMIT_RANGE: RangeInclusive<usize> = 500..=10_000;
pub const ROW_LIMIT_STEP: usize = 500;
pub const HISTOGRAM_BINS_RANGE: RangeInclusive<usize> = 5..=80;

/// Rows shown in the table preview.
pub const PREVIEW_ROWS: usize = 25;
/// Characters of the dataset description shown before truncation.
pub const SUMMARY_CHARS: usize = 900;

/// Runtime settings. Defaults target datos.gob.cl; each field can be
/// overridden from the environment (or a `.env` file).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// `CKAN_BASE_URL`
    pub base_url: String,
    /// `CKAN_TIMEOUT_SECS`
    pub timeout: Duration,
    /// `CKAN_DEFAULT_QUERY`
    pub default_query: String,
    /// `CKAN_SEARCH_ROWS`
    pub search_rows: usize,
    /// `CKAN_ROW_LIMIT`
    pub row_limit: usize,
    pub histogram_bins: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://datos.gob.cl/api/3/action".to_string(),
            timeout: Duration::from_secs(30),
            default_query: "hospital prestaciones producción".to_string(),
            search_rows: 20,
            row_limit: 5000,
            histogram_bins: 30,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unparseable values are logged
    /// and the default is kept.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("CKAN_BASE_URL").filter(|v| !v.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }
        if let Some(q) = lookup("CKAN_DEFAULT_QUERY") {
            config.default_query = q;
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "CKAN_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(rows) = parse_var(&lookup, "CKAN_SEARCH_ROWS") {
            config.search_rows = clamp_to(rows, &SEARCH_ROWS_RANGE);
        }
        if let Some(limit) = parse_var(&lookup, "CKAN_ROW_LIMIT") {
            config.row_limit = snap_row_limit(limit);
        }
        config
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("Ignoring {key}={raw:?}: not a valid number");
            None
        }
    }
}

fn clamp_to(v: usize, range: &RangeInclusive<usize>) -> usize {
    v.clamp(*range.start(), *range.end())
}

/// Clamp to the allowed row limits and round down to the slider step.
pub fn snap_row_limit(limit: usize) -> usize {
    let clamped = clamp_to(limit, &ROW_LIMIT_RANGE);
    (clamped / ROW_LIMIT_STEP * ROW_LIMIT_STEP).max(*ROW_LIMIT_RANGE.start())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_overrides() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config, Config::default());
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn overrides_are_parsed_and_clamped() {
        let config = Config::from_lookup(lookup(&[
            ("CKAN_BASE_URL", " https://catalog.example/api/3/action "),
            ("CKAN_TIMEOUT_SECS", "5"),
            ("CKAN_SEARCH_ROWS", "100"),
            ("CKAN_ROW_LIMIT", "1234"),
        ]));
        assert_eq!(config.base_url, "https://catalog.example/api/3/action");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.search_rows, 30);
        assert_eq!(config.row_limit, 1000);
    }

    #[test]
    fn garbage_overrides_keep_defaults() {
        let config = Config::from_lookup(lookup(&[("CKAN_ROW_LIMIT", "lots"), ("CKAN_BASE_URL", "")]));
        assert_eq!(config.row_limit, 5000);
        assert_eq!(config.base_url, Config::default().base_url);
    }

    #[test]
    fn row_limit_snaps_into_range() {
        assert_eq!(snap_row_limit(0), 500);
        assert_eq!(snap_row_limit(99_999), 10_000);
        assert_eq!(snap_row_limit(5000), 5000);
    }
}
