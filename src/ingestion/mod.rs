//! Ingestion: raw delimited text -> [`crate::store::TypedStore`].
//!
//! Most callers should use [`parse`] (or [`load_from_path`]) which:
//!
//! - splits lines and tokenizes fields ([`tokenizer`])
//! - binds schema fields to source columns once, from the header or by position ([`binder`])
//! - infers a typed [`crate::types::Value`] for every cell ([`coerce`])
//! - optionally reports success/warnings/failures/alerts to an [`IngestionObserver`]
//!
//! Behavior is configured through [`LoaderOptions`].

pub mod binder;
pub mod coerce;
pub mod loader;
pub mod observability;
pub mod options;
pub mod tokenizer;

pub use binder::{bind_columns, ColumnBinding};
pub use coerce::coerce;
pub use loader::{load_from_path, parse, parse_source, MEMORY_SOURCE};
pub use observability::{
    CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats,
    StdErrObserver, TracingObserver,
};
pub use options::{LoaderOptions, MissingFieldPolicy};
pub use tokenizer::{lines, FieldSpan, Line, Tokenizer};
