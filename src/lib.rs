//! `typed-csv-store` loads delimited text into a schematized, in-memory [`store::TypedStore`]
//! and validates the result against declarative per-field rules.
//!
//! The two entrypoints are [`ingestion::parse`] and [`validation::validate`]:
//!
//! - `parse` tokenizes the text (RFC4180-style quoting, zero-copy where possible), binds schema
//!   fields to columns by header name or by position, and infers a typed [`types::Value`] for
//!   every cell. It either yields a complete store or a single [`IngestionError`].
//! - `validate` checks the store against the schema's rules and returns a
//!   [`validation::ValidationReport`] listing *every* violation.
//!
//! ## Cell values
//!
//! Each cell is inferred with a fixed cascade:
//!
//! - `true`/`false` (any case) -> [`types::Value::Bool`]
//! - text without a decimal point that fits `i64` -> [`types::Value::Int64`]
//! - other numeric text -> [`types::Value::Float64`]
//! - anything else -> [`types::Value::Utf8`]
//! - empty fields -> [`types::Value::Null`]
//!
//! ## Store access
//!
//! The store keeps rows and columns in sync: `store.row(i)?.get(f)` and `store.column(f)?[i]`
//! always agree. Value indexes ([`store::TypedStore::build_index`]) are built lazily, once.
//!
//! ## Quick example
//!
//! ```rust
//! use typed_csv_store::ingestion::{parse, LoaderOptions};
//! use typed_csv_store::types::{Field, Schema, Value};
//! use typed_csv_store::validation::validate;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = Schema::new(vec![
//!     Field::new("ID").primary_key(),
//!     Field::new("Name").required(),
//!     Field::new("Level").range(1.0, 100.0),
//! ]);
//!
//! let text = "ID,Name,Level\n1,Alice,10\n2,Bob,\n2,Carol,5\n";
//! let store = parse(text, &schema, &LoaderOptions::default())?;
//! assert_eq!(store.column("Level")?, &[Value::Int64(10), Value::Null, Value::Int64(5)]);
//!
//! let report = validate(&store, &schema)?;
//! assert_eq!(report.error_count(), 1);
//! assert_eq!(report.errors[0].row, Some(2));
//! # Ok(())
//! # }
//! ```
//!
//! ## Observability
//!
//! Parse outcomes can be reported to an [`ingestion::IngestionObserver`] set on
//! [`ingestion::LoaderOptions::observer`]; built-in sinks write to stderr, a log file, or the
//! `tracing` facade. The loader and evaluator also emit `tracing` events of their own.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use typed_csv_store::ingestion::{parse, IngestionSeverity, LoaderOptions, StdErrObserver};
//! use typed_csv_store::types::Schema;
//!
//! let opts = LoaderOptions {
//!     observer: Some(Arc::new(StdErrObserver)),
//!     alert_at_or_above: IngestionSeverity::Error,
//!     ..Default::default()
//! };
//! let _ = parse("ID\n1\n", &Schema::from_names(["ID"]), &opts);
//! ```

pub mod error;
pub mod export;
pub mod ingestion;
pub mod store;
pub mod types;
pub mod validation;

pub use error::{IngestionError, IngestionResult, SchemaError, StoreError, StoreResult};
pub use ingestion::parse;
pub use validation::validate;
