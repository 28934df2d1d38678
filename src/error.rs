use std::error::Error as StdError;

use thiserror::Error;

use crate::types::ColumnType;

/// Convenience result type for conversion operations.
pub type ConversionResult<T> = Result<T, ConversionError>;

/// Boxed error produced by a [`crate::sink::DocumentSink`].
pub type BoxedSinkError = Box<dyn StdError + Send + Sync + 'static>;

/// Error type returned by sources and the conversion pipeline.
///
/// Any of these aborts the current run.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "excel")]
    /// Workbook read error (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// CSV read error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// The input could not be opened as a tabular source (unknown format, missing sheet, etc.).
    #[error("source error: {message}")]
    Source { message: String },

    /// A cell could not be converted into its column's inferred type.
    ///
    /// `row` and `column` are 1-based source coordinates.
    #[error(
        "failed to convert value at row {row} column {column} ('{header}') to {expected}: {message} (raw='{raw}')"
    )]
    Parse {
        row: usize,
        column: usize,
        header: String,
        expected: ColumnType,
        raw: String,
        message: String,
    },

    /// The document sink rejected a document. The sink's own error is kept as the source.
    #[error("sink rejected document {id} (row {row}): {source}")]
    Sink {
        row: usize,
        id: i64,
        #[source]
        source: BoxedSinkError,
    },
}

impl ConversionError {
    /// 1-based source row that triggered the failure, if the error is row-scoped.
    pub fn row(&self) -> Option<usize> {
        match self {
            Self::Parse { row, .. } | Self::Sink { row, .. } => Some(*row),
            _ => None,
        }
    }
}
