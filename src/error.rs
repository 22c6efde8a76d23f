use thiserror::Error;

/// Convenience result type for ingestion operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Convenience result type for store lookups.
pub type StoreResult<T> = Result<T, StoreError>;

/// Error type returned by [`crate::ingestion::parse`] and friends.
///
/// Every variant is fatal for the current parse call: no partial store is returned.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV writer error (export only).
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// A quoted field was opened but never closed before the end of its line.
    #[error("unterminated quoted field at line {line}, column {column}")]
    UnterminatedQuote { line: usize, column: usize },

    /// A header line was required but the input has no lines left after skipping.
    #[error("missing header: input has no header line")]
    MissingHeader,

    /// The header line contains no usable column names.
    #[error("empty header at line {line}")]
    EmptyHeader { line: usize },

    /// A schema field could not be matched against any header.
    #[error("schema mismatch: missing required column '{field}'. headers={headers:?}")]
    UnresolvedField { field: String, headers: Vec<String> },

    /// The input does not conform to the provided schema.
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// A data row does not have the number of fields the binding requires.
    #[error("column count mismatch at line {line}: expected {expected} fields, found {found}")]
    ColumnCountMismatch {
        line: usize,
        expected: usize,
        found: usize,
    },
}

/// Lookup failure on a [`crate::store::TypedStore`].
///
/// This is distinct from a present-but-null cell, which is returned as
/// [`crate::types::Value::Null`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("row index {index} out of bounds (rows={len})")]
    RowOutOfBounds { index: usize, len: usize },

    #[error("field position {index} out of bounds (fields={len})")]
    FieldOutOfBounds { index: usize, len: usize },

    #[error("row has {found} values but the schema declares {expected} fields")]
    RowArity { expected: usize, found: usize },
}

/// A schema declaration that cannot be evaluated.
///
/// Raised before any row is looked at.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid pattern '{pattern}' on field '{field}': {source}")]
    InvalidPattern {
        field: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid {rule} bounds on field '{field}': min {min} > max {max}")]
    InvalidBounds {
        field: String,
        rule: &'static str,
        min: String,
        max: String,
    },

    #[error("allowed-value set on field '{field}' is empty")]
    EmptyAllowedSet { field: String },

    #[error("schema json error: {0}")]
    Json(#[from] serde_json::Error),
}
