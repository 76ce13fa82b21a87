use thiserror::Error;

pub type FlowResult<T> = Result<T, FlowError>;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Io(#[from] IoError),
}

impl FlowError {
    /// True for caller mistakes such as a zero window or an unknown grouping field.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::Argument(_))
    }

    /// True when a record or input column breaks the expected flow schema.
    pub fn is_schema_violation(&self) -> bool {
        matches!(self, Self::Schema(_))
    }
}

/// Errors raised for invalid operation parameters or configuration.
#[derive(Debug, Error)]
pub enum ArgumentError {
    #[error("'{name}' must be a positive integer, got {value}")]
    NonPositive { name: &'static str, value: usize },

    #[error("Unknown key field: '{0}' (expected 'etf_ticker' or 'region')")]
    UnknownKeyField(String),

    #[error("Invalid date range: start {from} is after end {to}")]
    InvalidDateRange { from: String, to: String },

    #[error("Invalid analysis configuration: {0}")]
    InvalidConfig(String),
}

/// Errors raised when records or input columns do not match the flow schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Missing required column '{0}'")]
    MissingColumn(String),

    #[error("Row {row}: missing required field '{field}'")]
    MissingValue { row: usize, field: &'static str },

    #[error("Row {row}: invalid value '{value}' for field '{field}': {msg}")]
    InvalidValue {
        row: usize,
        field: &'static str,
        value: String,
        msg: String,
    },

    #[error("Column '{column}' has unsupported type {dtype}")]
    UnsupportedColumnType { column: String, dtype: String },
}

/// Errors raised by the underlying Polars frames.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Data frame error: {0}")]
    DataFrame(String),
}

/// Errors related to file I/O and serialization.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("IO operation failed")]
    Io(#[from] std::io::Error),

    #[error("Serialization failed")]
    Json(#[from] serde_json::Error),

    #[error("Failed to encode records")]
    Encoding(#[from] postcard::Error),

    #[error("File system error: {0}")]
    FileSystem(String),

    #[error("Failed to read data: {0}")]
    ReadFailed(String),

    #[error("Failed to write data: {0}")]
    WriteFailed(String),
}
