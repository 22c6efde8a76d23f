//! Loader configuration.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::observability::{IngestionObserver, IngestionSeverity};

/// What to do when a data row is missing a column the schema is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingFieldPolicy {
    /// Abort the parse with [`crate::IngestionError::ColumnCountMismatch`].
    #[default]
    Throw,
    /// Use the field's declared default (or null) and record a warning.
    SetDefault,
    /// Leave the field null and record a warning.
    Ignore,
}

/// Options controlling how delimited text is parsed into a store.
///
/// Use [`Default`] for common cases. Numbers are always parsed locale-invariantly (`.` as the
/// decimal point, no grouping separators).
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderOptions {
    /// Field delimiter.
    pub delimiter: char,
    /// Quote character.
    pub quote: char,
    /// First retained line is a header.
    pub has_header: bool,
    /// Trim surrounding whitespace from header names and unquoted fields.
    pub trim_fields: bool,
    /// Skip lines that are empty after trimming.
    pub ignore_empty_lines: bool,
    /// Lines whose trimmed text starts with this prefix are skipped entirely.
    pub comment_prefix: Option<String>,
    /// Behavior when a bound column is missing from a data row.
    pub missing_field_policy: MissingFieldPolicy,
    /// Treat any data row whose field count differs from the header (or schema, without a
    /// header) as a column-count mismatch.
    pub strict_column_count: bool,
    /// Keep source columns no schema field is bound to, addressable by ordinal.
    pub retain_extra_columns: bool,
    /// Optional observer for logging/alerts.
    #[serde(skip)]
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for LoaderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderOptions")
            .field("delimiter", &self.delimiter)
            .field("quote", &self.quote)
            .field("has_header", &self.has_header)
            .field("trim_fields", &self.trim_fields)
            .field("ignore_empty_lines", &self.ignore_empty_lines)
            .field("comment_prefix", &self.comment_prefix)
            .field("missing_field_policy", &self.missing_field_policy)
            .field("strict_column_count", &self.strict_column_count)
            .field("retain_extra_columns", &self.retain_extra_columns)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote: '"',
            has_header: true,
            trim_fields: true,
            ignore_empty_lines: true,
            comment_prefix: Some("#".to_string()),
            missing_field_policy: MissingFieldPolicy::Throw,
            strict_column_count: false,
            retain_extra_columns: true,
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

impl LoaderOptions {
    /// Read options from a JSON document; unspecified keys keep their defaults.
    pub fn from_json_str(input: &str) -> serde_json::Result<Self> {
        serde_json::from_str(input)
    }

    /// Whether `line` should be skipped as a comment or blank line.
    pub(crate) fn skips(&self, line: &str) -> bool {
        let trimmed = line.trim();
        if self.ignore_empty_lines && trimmed.is_empty() {
            return true;
        }
        match self.comment_prefix.as_deref() {
            Some(prefix) if !prefix.is_empty() => trimmed.starts_with(prefix),
            _ => false,
        }
    }
}
