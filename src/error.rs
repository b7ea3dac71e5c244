use thiserror::Error;

/// Failures while talking to the catalog or materializing a resource.
///
/// These are terminal for the interaction that triggered them and are shown
/// to the user verbatim; no other strategy is tried after one of them.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Transport failure, timeout, or non-2xx status.
    #[error("request to {action} failed: {source}")]
    Http {
        action: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The catalog answered but reported `success: false`.
    #[error("catalog rejected {action}: {message}")]
    Rejected { action: &'static str, message: String },

    #[error("unexpected payload from {action}: {source}")]
    Decode {
        action: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV row {row} has {found} fields but the header has {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("malformed table: {0}")]
    Shape(#[from] AnalysisError),
}

/// Failures of the numeric pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Coercion or filtering removed every value.
    #[error("column '{column}' has no valid numeric values")]
    EmptySeries { column: String },

    #[error("column '{0}' does not exist in the table")]
    UnknownColumn(String),

    #[error("column '{0}' appears more than once in the header")]
    DuplicateColumn(String),

    #[error("row {row} has {found} cells but the table has {expected} columns")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
}
