use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the hotel analysis.
#[derive(Error, Debug)]
pub enum HotelError {
    /// A row failed one of the cleaning rules.
    #[error("Invalid row {key}: {reason}")]
    InvalidRow { key: String, reason: String },

    /// A fact row had no matching row in a dimension table.
    #[error("Unjoinable row {key}: no match in {table}")]
    UnjoinableRow { key: String, table: String },

    /// Occupancy was requested for a row whose capacity is zero.
    #[error("Division by zero: row {key} has zero capacity")]
    DivisionByZero { key: String },

    /// A statistic was requested over a column that has no values.
    #[error("Column {0} has no values")]
    EmptyColumn(String),

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV document could not be parsed into the expected record type.
    #[error("Failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A date string did not match any recognised layout.
    #[error("Invalid date format: {0}")]
    DateParse(String),

    /// A required dataset file was not found under the data directory.
    #[error("Dataset not found: {0}")]
    MissingDataset(String),

    /// The expected data directory does not exist.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A report could not be serialised.
    #[error("Failed to serialise JSON: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HotelError {
    /// Build an [`HotelError::InvalidRow`].
    pub fn invalid_row(key: impl Into<String>, reason: impl Into<String>) -> Self {
        HotelError::InvalidRow {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Build an [`HotelError::UnjoinableRow`].
    pub fn unjoinable(key: impl Into<String>, table: impl Into<String>) -> Self {
        HotelError::UnjoinableRow {
            key: key.into(),
            table: table.into(),
        }
    }
}

/// Convenience alias used throughout the hotel crates.
pub type Result<T> = std::result::Result<T, HotelError>;
