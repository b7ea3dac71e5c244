use std::path::Path;

use crate::catalog::client::CatalogApi;
use crate::catalog::model::{Dataset, DatasetSummary, Resource};
use crate::config::{snap_row_limit, Config};
use crate::data::analysis::Analysis;
use crate::data::export::write_csv;
use crate::data::filter::{prepare, RangeFilter};
use crate::data::loader::load;
use crate::data::model::Table;
use crate::data::narrative::conclusion;
use crate::data::profile::{classify, Profile};
use crate::data::stats::{aggregate, histogram, AggregateMode, AggregateResult, Bin};

// ---------------------------------------------------------------------------
// Notices – user-visible messages scoped to the stage that raised them
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub text: String,
}

impl Notice {
    fn info(text: impl Into<String>) -> Option<Self> {
        Some(Self { level: Level::Info, text: text.into() })
    }

    fn warning(text: impl Into<String>) -> Option<Self> {
        Some(Self { level: Level::Warning, text: text.into() })
    }

    fn error(text: impl Into<String>) -> Option<Self> {
        Some(Self { level: Level::Error, text: text.into() })
    }
}

/// One slot per pipeline stage. A failure only blanks the views fed by
/// its own stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notices {
    pub search: Option<Notice>,
    pub dataset: Option<Notice>,
    pub load: Option<Notice>,
    pub analysis: Option<Notice>,
    pub aggregate: Option<Notice>,
    pub export: Option<Notice>,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full session state, independent of rendering. Every selection
/// change recomputes the stages below it from scratch.
pub struct AppState {
    catalog: Box<dyn CatalogApi>,

    /// Search inputs.
    pub query: String,
    pub search_rows: usize,
    pub row_limit: usize,
    pub histogram_bins: usize,

    /// Results of the last successful search (None until the first one).
    pub datasets: Option<Vec<DatasetSummary>>,
    pub dataset: Option<Dataset>,
    pub resource_index: Option<usize>,

    /// Materialized resource and its profile.
    pub table: Option<Table>,
    pub profile: Option<Profile>,

    /// Selected indicator column and the full extent of its values.
    pub value_column: Option<String>,
    pub bounds: Option<RangeFilter>,
    pub range: Option<RangeFilter>,
    pub analysis: Option<Analysis>,

    pub category_column: Option<String>,
    pub mode: AggregateMode,
    pub aggregate: Option<AggregateResult>,

    pub notices: Notices,
}

impl AppState {
    pub fn new(config: &Config, catalog: Box<dyn CatalogApi>) -> Self {
        Self {
            catalog,
            query: config.default_query.clone(),
            search_rows: config.search_rows,
            row_limit: config.row_limit,
            histogram_bins: config.histogram_bins,
            datasets: None,
            dataset: None,
            resource_index: None,
            table: None,
            profile: None,
            value_column: None,
            bounds: None,
            range: None,
            analysis: None,
            category_column: None,
            mode: AggregateMode::default(),
            aggregate: None,
            notices: Notices::default(),
        }
    }

    // -- Catalog stages --

    /// Run the dataset search and select the first hit.
    pub fn search(&mut self) {
        match self.catalog.search(&self.query, self.search_rows) {
            Ok(hits) => {
                log::info!("Search '{}' returned {} datasets", self.query, hits.len());
                self.clear_from_dataset();
                self.notices.search = if hits.is_empty() {
                    Notice::error("No datasets found. Try other keywords (e.g. 'egresos hospitalarios', 'camas', 'urgencia').")
                } else {
                    Notice::info("Search completed.")
                };
                let first = hits.first().map(|d| d.id.clone());
                self.datasets = Some(hits);
                if let Some(id) = first {
                    self.select_dataset(&id);
                }
            }
            Err(e) => {
                log::error!("Dataset search failed: {e}");
                self.notices.search = Notice::error(format!("Error searching datasets: {e}"));
            }
        }
    }

    pub fn select_dataset(&mut self, dataset_id: &str) {
        self.clear_from_dataset();
        match self.catalog.show(dataset_id) {
            Ok(dataset) => {
                let first_resource = (!dataset.resources.is_empty()).then_some(0);
                if first_resource.is_none() {
                    self.notices.dataset = Notice::warning("This dataset has no resources available.");
                }
                self.dataset = Some(dataset);
                if let Some(idx) = first_resource {
                    self.select_resource(idx);
                }
            }
            Err(e) => {
                log::error!("Loading dataset {dataset_id} failed: {e}");
                self.notices.dataset = Notice::error(format!("Error loading dataset: {e}"));
            }
        }
    }

    pub fn selected_resource(&self) -> Option<&Resource> {
        self.dataset.as_ref()?.resources.get(self.resource_index?)
    }

    pub fn select_resource(&mut self, index: usize) {
        self.clear_from_table();
        let Some(resource) = self.dataset.as_ref().and_then(|d| d.resources.get(index)) else {
            return;
        };
        let resource = resource.clone();
        self.resource_index = Some(index);

        match load(self.catalog.as_ref(), &resource, self.row_limit) {
            Ok(Some(table)) if !table.is_empty() => {
                log::info!(
                    "Loaded {} rows x {} columns from {}",
                    table.len(),
                    table.columns().len(),
                    resource.id
                );
                self.set_table(table);
            }
            Ok(_) => {
                self.notices.load = Notice::error(
                    "Could not load this resource. Try another one (ideally DataStore or CSV).",
                );
            }
            Err(e) => {
                log::error!("Loading resource {} failed: {e}", resource.id);
                self.notices.load = Notice::error(format!("Error loading resource: {e}"));
            }
        }
    }

    /// Change the structured-store row cap and reload the current resource.
    pub fn set_row_limit(&mut self, limit: usize) {
        let limit = snap_row_limit(limit);
        if limit == self.row_limit {
            return;
        }
        self.row_limit = limit;
        if let Some(idx) = self.resource_index {
            self.select_resource(idx);
        }
    }

    // -- Analysis stages --

    fn set_table(&mut self, table: Table) {
        let profile = classify(&table);
        let first_numeric = profile.numeric.first().cloned();
        self.table = Some(table);
        self.profile = Some(profile);

        match first_numeric {
            Some(col) => self.select_column(&col),
            None => {
                self.notices.analysis = Notice::warning(
                    "No numeric columns detected in this resource. Try another resource of the same dataset.",
                );
            }
        }
    }

    /// Choose the indicator; the range resets to the column's full extent.
    pub fn select_column(&mut self, column: &str) {
        self.clear_from_column();
        let Some(table) = &self.table else {
            return;
        };
        self.value_column = Some(column.to_string());

        match prepare(table, column).and_then(|s| RangeFilter::spanning(&s)) {
            Ok(bounds) => {
                self.bounds = Some(bounds);
                self.range = Some(bounds);
                self.recompute_analysis();
            }
            Err(e) => {
                log::warn!("Column '{column}' unusable: {e}");
                self.notices.analysis = Notice::warning(format!("{e}. Choose another column."));
            }
        }
    }

    /// Move the inclusive range filter. `hi < lo` yields an empty selection.
    pub fn set_range(&mut self, lo: f64, hi: f64) {
        if self.value_column.is_none() {
            return;
        }
        self.range = Some(RangeFilter::new(lo, hi));
        self.recompute_analysis();
    }

    fn recompute_analysis(&mut self) {
        self.analysis = None;
        self.aggregate = None;
        self.notices.analysis = None;
        self.notices.aggregate = None;

        let (Some(table), Some(column), Some(range)) = (&self.table, &self.value_column, self.range)
        else {
            return;
        };

        match Analysis::compute(table, column, range) {
            Ok(analysis) => {
                let keep = self
                    .category_column
                    .as_ref()
                    .filter(|c| analysis.categories.contains(*c))
                    .cloned();
                self.category_column = keep.or_else(|| analysis.categories.first().cloned());
                self.analysis = Some(analysis);
                self.recompute_aggregate();
            }
            Err(e) => {
                log::warn!("Analysis of '{column}' failed: {e}");
                self.notices.analysis =
                    Notice::warning(format!("{e} in the selected range. Widen the range or choose another column."));
            }
        }
    }

    pub fn select_category(&mut self, column: &str) {
        self.category_column = Some(column.to_string());
        self.recompute_aggregate();
    }

    pub fn set_mode(&mut self, mode: AggregateMode) {
        self.mode = mode;
        self.recompute_aggregate();
    }

    fn recompute_aggregate(&mut self) {
        self.aggregate = None;
        self.notices.aggregate = None;
        let Some(analysis) = &self.analysis else {
            return;
        };
        let Some(category) = &self.category_column else {
            self.notices.aggregate = Notice::info(
                "No low-cardinality categorical columns detected to build a top 15.",
            );
            return;
        };

        match aggregate(&analysis.filtered, &analysis.column, category, self.mode) {
            Ok(result) => self.aggregate = Some(result),
            Err(e) => {
                log::error!("Aggregation by '{category}' failed: {e}");
                self.notices.aggregate = Notice::error(e.to_string());
            }
        }
    }

    // -- Derived views --

    pub fn histogram(&self) -> Vec<Bin> {
        self.analysis
            .as_ref()
            .map(|a| histogram(&a.series, self.histogram_bins))
            .unwrap_or_default()
    }

    pub fn conclusion(&self) -> Vec<String> {
        self.analysis
            .as_ref()
            .map(|a| conclusion(&a.column, &a.stats))
            .unwrap_or_default()
    }

    /// Save the filtered table as CSV.
    pub fn export_to(&mut self, path: &Path) {
        let Some(analysis) = &self.analysis else {
            return;
        };
        self.notices.export = match write_csv(&analysis.filtered, path) {
            Ok(()) => Notice::info(format!(
                "Saved {} rows to {}",
                analysis.filtered.len(),
                path.display()
            )),
            Err(e) => {
                log::error!("CSV export failed: {e:#}");
                Notice::error(format!("Export failed: {e:#}"))
            }
        };
    }

    // -- Resets --

    fn clear_from_dataset(&mut self) {
        self.dataset = None;
        self.notices.dataset = None;
        self.clear_from_table();
    }

    fn clear_from_table(&mut self) {
        self.resource_index = None;
        self.table = None;
        self.profile = None;
        self.notices.load = None;
        self.clear_from_column();
    }

    fn clear_from_column(&mut self) {
        self.value_column = None;
        self.bounds = None;
        self.range = None;
        self.analysis = None;
        self.aggregate = None;
        self.notices.analysis = None;
        self.notices.aggregate = None;
        self.notices.export = None;
    }
}
