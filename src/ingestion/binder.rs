//! Schema field -> source column binding.

use crate::error::{IngestionError, IngestionResult};
use crate::types::{names_match, FieldId, Schema};

use super::tokenizer::FieldSpan;

/// Resolved mapping from schema positions to source column indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnBinding {
    columns: Vec<usize>,
    /// Bound source columns, sorted.
    bound: Vec<usize>,
}

impl ColumnBinding {
    fn new(columns: Vec<usize>) -> Self {
        let mut bound = columns.clone();
        bound.sort_unstable();
        Self { columns, bound }
    }

    /// Source column for each schema position, in schema order.
    pub fn columns(&self) -> &[usize] {
        &self.columns
    }

    /// Source column bound to schema position `field`.
    pub fn source_column(&self, field: usize) -> Option<usize> {
        self.columns.get(field).copied()
    }

    /// Minimum number of fields a row needs so every bound column exists.
    ///
    /// Saturates at `usize::MAX` for an ordinal bound to the last representable column.
    pub fn required_width(&self) -> usize {
        self.bound.last().map_or(0, |c| c.saturating_add(1))
    }

    /// Whether some schema field reads source column `column`.
    pub fn is_bound(&self, column: usize) -> bool {
        self.bound.binary_search(&column).is_ok()
    }
}

/// Bind every schema field to a source column.
///
/// With a header, named fields match header text case-insensitively after trimming, and a name
/// with no matching header is an [`IngestionError::UnresolvedField`]. Without a header, the
/// field at schema position `i` reads column `i`. Ordinal identifiers always read their own
/// column. Two fields bound to the same column is a [`IngestionError::SchemaMismatch`].
pub fn bind_columns(schema: &Schema, header: Option<&[FieldSpan<'_>]>) -> IngestionResult<ColumnBinding> {
    let names: Option<Vec<&str>> = header.map(|h| h.iter().map(|f| f.as_str().trim()).collect());

    let mut columns = Vec::with_capacity(schema.fields.len());
    for (pos, field) in schema.fields.iter().enumerate() {
        let column = match (&field.id, names.as_deref()) {
            (FieldId::Ordinal(c), _) => *c,
            (FieldId::Name(name), Some(names)) => {
                names
                    .iter()
                    .position(|h| names_match(h, name))
                    .ok_or_else(|| IngestionError::UnresolvedField {
                        field: name.clone(),
                        headers: names.iter().map(|h| h.to_string()).collect(),
                    })?
            }
            (FieldId::Name(_), None) => pos,
        };

        if let Some(prev) = columns.iter().position(|&c| c == column) {
            return Err(IngestionError::SchemaMismatch {
                message: format!(
                    "fields '{}' and '{}' both bind to column {column}",
                    schema.fields[prev].label(),
                    field.label()
                ),
            });
        }
        columns.push(column);
    }

    Ok(ColumnBinding::new(columns))
}
