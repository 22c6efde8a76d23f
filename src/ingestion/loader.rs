//! Text -> [`TypedStore`] pipeline.
//!
//! Lines are split, comments and blank lines skipped, the header (if any) bound to the schema
//! once, and every data line tokenized and coerced into a row.
//!
//! When an [`super::observability::IngestionObserver`] is configured, every entry point
//! reports:
//!
//! - `on_warning` for each recovered per-row anomaly
//! - `on_success` on success, with row/warning/skipped-line stats
//! - `on_failure` on failure, with a computed severity
//! - `on_alert` on failure when that severity is >= `options.alert_at_or_above`

use std::fs;
use std::path::Path;

use crate::error::{IngestionError, IngestionResult};
use crate::store::{LoadWarning, TypedStore};
use crate::types::{Schema, Value};

use super::binder::{bind_columns, ColumnBinding};
use super::coerce::coerce;
use super::observability::{severity_for_error, IngestionContext, IngestionStats};
use super::options::{LoaderOptions, MissingFieldPolicy};
use super::tokenizer::{lines, FieldSpan, Line, Lines, Tokenizer, UnterminatedQuote};

/// Source name used by [`parse`].
pub const MEMORY_SOURCE: &str = "<memory>";

/// Parse an in-memory buffer into a [`TypedStore`].
///
/// Either the whole input loads or a single [`IngestionError`] is returned; there is no
/// partial store.
///
/// ```rust
/// use typed_csv_store::ingestion::{parse, LoaderOptions};
/// use typed_csv_store::types::{Schema, Value};
///
/// let schema = Schema::from_names(["ID", "Name", "Level"]);
/// let text = "ID,Name,Level\n1,Alice,10\n2,Bob,\n";
/// let store = parse(text, &schema, &LoaderOptions::default()).unwrap();
///
/// assert_eq!(store.row_count(), 2);
/// assert_eq!(store.column("Level").unwrap(), &[Value::Int64(10), Value::Null]);
/// ```
pub fn parse(text: &str, schema: &Schema, options: &LoaderOptions) -> IngestionResult<TypedStore> {
    parse_source(MEMORY_SOURCE, text, schema, options)
}

/// Like [`parse`], with a human-readable source name for diagnostics.
///
/// A leading UTF-8 byte-order mark is ignored.
pub fn parse_source(
    source: &str,
    text: &str,
    schema: &Schema,
    options: &LoaderOptions,
) -> IngestionResult<TypedStore> {
    let ctx = IngestionContext {
        source: source.to_string(),
    };
    let result = load(&ctx, text, schema, options);
    finish(&ctx, options, result)
}

/// Read a UTF-8 file and parse it.
///
/// I/O failures (missing file, invalid UTF-8) surface as [`IngestionError::Io`] and are
/// reported as `Critical`.
pub fn load_from_path(
    path: impl AsRef<Path>,
    schema: &Schema,
    options: &LoaderOptions,
) -> IngestionResult<TypedStore> {
    let path = path.as_ref();
    let ctx = IngestionContext {
        source: path.display().to_string(),
    };
    let result = fs::read_to_string(path)
        .map_err(IngestionError::from)
        .and_then(|text| load(&ctx, &text, schema, options));
    finish(&ctx, options, result)
}

struct Loaded {
    store: TypedStore,
    skipped_lines: usize,
}

fn finish(
    ctx: &IngestionContext,
    options: &LoaderOptions,
    result: IngestionResult<Loaded>,
) -> IngestionResult<TypedStore> {
    match &result {
        Ok(loaded) => {
            tracing::debug!(
                source = %ctx.source,
                rows = loaded.store.row_count(),
                skipped_lines = loaded.skipped_lines,
                "parse finished"
            );
        }
        Err(e) => tracing::debug!(source = %ctx.source, error = %e, "parse failed"),
    }

    if let Some(obs) = options.observer.as_ref() {
        match &result {
            Ok(loaded) => obs.on_success(
                ctx,
                IngestionStats {
                    rows: loaded.store.row_count(),
                    warnings: loaded.store.load_warnings().len(),
                    skipped_lines: loaded.skipped_lines,
                },
            ),
            Err(e) => {
                let sev = severity_for_error(e);
                obs.on_failure(ctx, sev, e);
                if sev >= options.alert_at_or_above {
                    obs.on_alert(ctx, sev, e);
                }
            }
        }
    }

    result.map(|loaded| loaded.store)
}

/// Lines left after dropping comments and (optionally) blank lines.
struct ContentLines<'a, 'o> {
    inner: Lines<'a>,
    options: &'o LoaderOptions,
    skipped: usize,
}

impl<'a> Iterator for ContentLines<'a, '_> {
    type Item = Line<'a>;

    fn next(&mut self) -> Option<Line<'a>> {
        for line in self.inner.by_ref() {
            if self.options.skips(line.text) {
                self.skipped += 1;
                continue;
            }
            return Some(line);
        }
        None
    }
}

fn load(
    ctx: &IngestionContext,
    text: &str,
    schema: &Schema,
    options: &LoaderOptions,
) -> IngestionResult<Loaded> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let tokenizer = Tokenizer::new(options.delimiter).with_quote(options.quote);
    let mut content = ContentLines {
        inner: lines(text),
        options,
        skipped: 0,
    };

    tracing::debug!(source = %ctx.source, fields = schema.len(), has_header = options.has_header, "parse started");

    let (binding, expected_width) = if options.has_header {
        let line = content.next().ok_or(IngestionError::MissingHeader)?;
        let header = tokenize(&tokenizer, &line)?;
        if header.iter().all(|f| f.as_str().trim().is_empty()) {
            return Err(IngestionError::EmptyHeader { line: line.number });
        }
        (bind_columns(schema, Some(&header))?, header.len())
    } else {
        (bind_columns(schema, None)?, schema.len())
    };

    let mut store = TypedStore::new(schema.clone());
    let builder = RowBuilder {
        schema,
        options,
        binding: &binding,
        expected_width,
    };

    for line in content.by_ref() {
        let fields = tokenize(&tokenizer, &line)?;
        let row = store.row_count();
        let (values, anomalies) = builder.build(&line, &fields)?;
        store
            .add_parsed(values, line.number)
            .map_err(|e| IngestionError::SchemaMismatch {
                message: e.to_string(),
            })?;

        for message in anomalies {
            let warning = LoadWarning {
                line: line.number,
                row,
                message,
            };
            tracing::warn!(source = %ctx.source, line = warning.line, row, "{}", warning.message);
            if let Some(obs) = options.observer.as_ref() {
                obs.on_warning(ctx, &warning);
            }
            store.push_warning(warning);
        }
    }

    Ok(Loaded {
        store,
        skipped_lines: content.skipped,
    })
}

fn tokenize<'a>(tokenizer: &Tokenizer, line: &Line<'a>) -> IngestionResult<Vec<FieldSpan<'a>>> {
    tokenizer
        .tokenize(line.text)
        .map_err(|UnterminatedQuote { offset }| IngestionError::UnterminatedQuote {
            line: line.number,
            column: line.text[..offset].chars().count() + 1,
        })
}

/// Turns one tokenized data line into schema-ordered values.
struct RowBuilder<'s> {
    schema: &'s Schema,
    options: &'s LoaderOptions,
    binding: &'s ColumnBinding,
    expected_width: usize,
}

impl RowBuilder<'_> {
    /// Returns the row values plus messages for any recovered anomalies.
    fn build(&self, line: &Line<'_>, fields: &[FieldSpan<'_>]) -> IngestionResult<(Vec<Value>, Vec<String>)> {
        let policy = self.options.missing_field_policy;
        let found = fields.len();
        let mut anomalies = Vec::new();

        if self.options.strict_column_count && found != self.expected_width {
            if policy == MissingFieldPolicy::Throw {
                return Err(IngestionError::ColumnCountMismatch {
                    line: line.number,
                    expected: self.expected_width,
                    found,
                });
            }
            anomalies.push(format!(
                "expected {} fields, found {found}",
                self.expected_width
            ));
        }

        let mut values = Vec::with_capacity(found.max(self.schema.len()));
        let mut missing = Vec::new();
        for (field, &column) in self.schema.fields.iter().zip(self.binding.columns()) {
            match fields.get(column) {
                Some(span) => values.push(self.coerce_span(span)),
                None => {
                    missing.push(field.label());
                    values.push(match policy {
                        MissingFieldPolicy::SetDefault => field.default.clone().unwrap_or(Value::Null),
                        MissingFieldPolicy::Throw | MissingFieldPolicy::Ignore => Value::Null,
                    });
                }
            }
        }

        if !missing.is_empty() {
            let action = match policy {
                MissingFieldPolicy::Throw => {
                    return Err(IngestionError::ColumnCountMismatch {
                        line: line.number,
                        expected: self.binding.required_width(),
                        found,
                    });
                }
                MissingFieldPolicy::SetDefault => "default applied",
                MissingFieldPolicy::Ignore => "left null",
            };
            anomalies.push(format!("missing column(s) {}; {action}", missing.join(", ")));
        }

        if self.options.retain_extra_columns {
            for (column, span) in fields.iter().enumerate() {
                if !self.binding.is_bound(column) {
                    values.push(self.coerce_span(span));
                }
            }
        }

        Ok((values, anomalies))
    }

    fn coerce_span(&self, span: &FieldSpan<'_>) -> Value {
        let text = span.as_str();
        if self.options.trim_fields && !span.quoted {
            coerce(text.trim())
        } else {
            coerce(text)
        }
    }
}
