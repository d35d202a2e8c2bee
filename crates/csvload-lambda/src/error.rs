//! Loader error types

use thiserror::Error;

use crate::quote::MalformedQuote;

/// Result type alias for loader operations
pub type LoaderResult<T> = std::result::Result<T, LoaderError>;

/// Errors raised while loading one object into the table
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Invalid trigger event: {0}")]
    InvalidEvent(String),

    #[error("Failed to get object s3://{bucket}/{key}: {message}")]
    ObjectRead {
        bucket: String,
        key: String,
        message: String,
    },

    #[error("CSV error: {0}")]
    Csv(#[source] csv_async::Error),

    #[error("Malformed row: {0}")]
    MalformedRow(#[source] MalformedQuote),

    #[error("Row at line {line} has {fields} field(s), expected at least {expected}")]
    ShortRow {
        line: u64,
        fields: usize,
        expected: usize,
    },

    #[error("Batch write to table {table} failed: {message}")]
    BatchWrite { table: String, message: String },

    #[error("{count} item(s) left unprocessed by table {table}")]
    Unprocessed { table: String, count: usize },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl LoaderError {
    /// Whether this error arose while reading the input stream.
    ///
    /// Read errors end ingestion of the current object without failing the
    /// invocation; everything else is reported to the runtime.
    pub fn is_read_error(&self) -> bool {
        matches!(
            self,
            LoaderError::Csv(_) | LoaderError::MalformedRow(_) | LoaderError::ShortRow { .. }
        )
    }
}

impl From<csv_async::Error> for LoaderError {
    /// Quoting violations reach the CSV reader as I/O errors from the
    /// underlying stream; they are unwrapped into [`LoaderError::MalformedRow`].
    fn from(err: csv_async::Error) -> Self {
        if let csv_async::ErrorKind::Io(io) = err.kind() {
            if let Some(quote) = io
                .get_ref()
                .and_then(|inner| inner.downcast_ref::<MalformedQuote>())
            {
                return LoaderError::MalformedRow(quote.clone());
            }
        }
        LoaderError::Csv(err)
    }
}
