//! Error types for the gridworld crate

use thiserror::Error;

/// Main error type for the gridworld crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("layout has no cells")]
    EmptyLayout,

    #[error("layout row {row} has {got} cells, expected {expected}")]
    RaggedLayout {
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("invalid cell code '{token}' on line {line}")]
    InvalidCellToken { token: String, line: usize },

    #[error("layout has no free cells to start episodes from")]
    NoFreeCells,

    #[error("position ({row}, {col}) is outside the {rows}x{cols} grid")]
    PositionOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("start position ({row}, {col}) is not a free cell")]
    StartNotFree { row: usize, col: usize },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::InvalidConfiguration {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}
