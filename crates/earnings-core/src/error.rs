use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the earnings tooling outside of row parsing.
#[derive(Error, Debug)]
pub enum EarningsError {
    /// An input file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A report could not be serialized to JSON.
    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A timezone name is not a recognised IANA identifier.
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the earnings crates.
pub type Result<T> = std::result::Result<T, EarningsError>;

/// Raised by the classifier when no keyword rule matches a description.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("Unclassified description: {0:?}")]
    UnclassifiedDescription(String),
}

/// Why a single logical row did not produce a transaction.
///
/// Row errors are expected and non-fatal: the parser records them and keeps
/// scanning, and any one of them taints the whole batch.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowError {
    /// The line is neither tab-delimited nor the start of a multi-line record.
    #[error("Unrecognized line")]
    Unrecognized,

    /// The text before the first money column is not a valid date/time.
    #[error("No valid date in {0:?}")]
    NoDate(String),

    /// Fewer than three `$` cells were found.
    #[error("Expected at least 3 money columns, found {found}")]
    InsufficientMoneyColumns { found: usize },

    /// A `$` cell is not a decimal amount.
    #[error("Invalid amount: {0:?}")]
    InvalidAmount(String),

    /// `gross - fee` does not equal `net` at two decimal places.
    #[error("Amounts do not reconcile: {gross} - {fee} != {net}")]
    AmountMismatch {
        gross: String,
        fee: String,
        net: String,
    },

    /// The description matched no classification rule.
    #[error("Unclassified description: {0:?}")]
    Unclassified(String),
}

/// Raised when summing a batch leaves the range of a `Decimal`.
///
/// Every row parsed on its own, but the batch as a whole cannot be totalled.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateError {
    #[error("Amounts are too large to total")]
    Overflow,
}

impl From<ClassifyError> for RowError {
    fn from(err: ClassifyError) -> Self {
        match err {
            ClassifyError::UnclassifiedDescription(desc) => RowError::Unclassified(desc),
        }
    }
}
