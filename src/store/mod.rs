//! In-memory typed store with synchronized row-major and column-major views.
//!
//! A [`TypedStore`] keeps every row as a `Vec<Value>` and, for every schema field, a column
//! holding the same values in row order. All writes go through [`TypedStore::add`] and
//! [`TypedStore::set_value`], which update both views together, so for every row `i` and
//! field `f`:
//!
//! ```text
//! store.row(i)?.get(f)? == &store.column(f)?[i]
//! ```
//!
//! Per-field [`ValueIndex`]es are built lazily on first request and cached. Building is
//! idempotent, so concurrent readers of a finished store may request indexes freely.
//!
//! ```rust
//! use typed_csv_store::store::TypedStore;
//! use typed_csv_store::types::{Schema, Value};
//!
//! let mut store = TypedStore::new(Schema::from_names(["id", "team"]));
//! store.add(vec![Value::Int64(1), Value::from("red")]).unwrap();
//! store.add(vec![Value::Int64(2), Value::from("blue")]).unwrap();
//! store.add(vec![Value::Int64(3), Value::from("red")]).unwrap();
//!
//! assert_eq!(store.column("team").unwrap()[2], Value::from("red"));
//! assert_eq!(store.build_index("team").unwrap().get(&Value::from("red")), &[0, 2]);
//! assert_eq!(store.find("id", &Value::Int64(2)).unwrap().unwrap().index(), 1);
//! ```

mod index;
mod row;

use std::fmt;
use std::sync::OnceLock;

use serde::Serialize;

use crate::error::{StoreError, StoreResult};
use crate::types::{FieldRef, FromValue, Schema, Value};

pub use index::ValueIndex;
pub use row::RowView;

/// A recovered per-row anomaly recorded while loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadWarning {
    /// 1-based source line.
    pub line: usize,
    /// Row index the anomaly applies to.
    pub row: usize,
    pub message: String,
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} (row {}): {}", self.line, self.row, self.message)
    }
}

/// Typed, schema-bound row store.
#[derive(Debug, Clone)]
pub struct TypedStore {
    schema: Schema,
    rows: Vec<Vec<Value>>,
    columns: Vec<Vec<Value>>,
    indexes: Vec<OnceLock<ValueIndex>>,
    source_lines: Vec<Option<usize>>,
    warnings: Vec<LoadWarning>,
}

impl TypedStore {
    /// Create an empty store for `schema`.
    pub fn new(schema: Schema) -> Self {
        let width = schema.len();
        Self {
            schema,
            rows: Vec::new(),
            columns: vec![Vec::new(); width],
            indexes: (0..width).map(|_| OnceLock::new()).collect(),
            source_lines: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Create a store from schema and rows.
    pub fn from_rows(schema: Schema, rows: Vec<Vec<Value>>) -> StoreResult<Self> {
        let mut store = Self::new(schema);
        for row in rows {
            store.add(row)?;
        }
        Ok(store)
    }

    /// Append a row and return its index.
    ///
    /// The first `schema.len()` values belong to the schema fields in order; any further values
    /// are kept as extras.
    pub fn add(&mut self, values: Vec<Value>) -> StoreResult<usize> {
        self.push(values, None)
    }

    pub(crate) fn add_parsed(&mut self, values: Vec<Value>, line: usize) -> StoreResult<usize> {
        self.push(values, Some(line))
    }

    pub(crate) fn push_warning(&mut self, warning: LoadWarning) {
        self.warnings.push(warning);
    }

    fn push(&mut self, values: Vec<Value>, line: Option<usize>) -> StoreResult<usize> {
        let width = self.schema.len();
        if values.len() < width {
            return Err(StoreError::RowArity {
                expected: width,
                found: values.len(),
            });
        }

        let row = self.rows.len();
        for (column, value) in self.columns.iter_mut().zip(&values[..width]) {
            column.push(value.clone());
        }
        self.rows.push(values);
        self.source_lines.push(line);
        for idx in &mut self.indexes {
            // Cached indexes no longer cover every row.
            idx.take();
        }
        Ok(row)
    }

    /// Schema the store is bound to.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Number of rows in the store.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of schema fields (columns).
    pub fn field_count(&self) -> usize {
        self.schema.len()
    }

    /// Row `index`, in O(1).
    pub fn row(&self, index: usize) -> StoreResult<RowView<'_>> {
        self.rows
            .get(index)
            .map(|values| RowView::new(index, &self.schema, values))
            .ok_or(StoreError::RowOutOfBounds {
                index,
                len: self.rows.len(),
            })
    }

    /// Iterate rows in order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = RowView<'_>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(i, values)| RowView::new(i, &self.schema, values))
    }

    /// Materialized column of a field, in O(1).
    pub fn column<'f>(&self, field: impl Into<FieldRef<'f>>) -> StoreResult<&[Value]> {
        let pos = self.resolve(field.into())?;
        Ok(&self.columns[pos])
    }

    /// Column converted to `T`; null and non-convertible cells are `None`.
    pub fn column_as<'f, T: FromValue>(&self, field: impl Into<FieldRef<'f>>) -> StoreResult<Vec<Option<T>>> {
        Ok(self.column(field)?.iter().map(T::from_value).collect())
    }

    /// Cell at (`row`, `field`).
    pub fn value<'f>(&self, row: usize, field: impl Into<FieldRef<'f>>) -> StoreResult<&Value> {
        let pos = self.resolve(field.into())?;
        self.columns[pos].get(row).ok_or(StoreError::RowOutOfBounds {
            index: row,
            len: self.rows.len(),
        })
    }

    /// Replace one cell, returning the previous value.
    ///
    /// Both views are updated and the field's cached index is dropped.
    pub fn set_value<'f>(
        &mut self,
        row: usize,
        field: impl Into<FieldRef<'f>>,
        value: Value,
    ) -> StoreResult<Value> {
        let pos = self.resolve(field.into())?;
        let len = self.rows.len();
        let cells = self
            .rows
            .get_mut(row)
            .ok_or(StoreError::RowOutOfBounds { index: row, len })?;

        cells[pos] = value.clone();
        let previous = std::mem::replace(&mut self.columns[pos][row], value);
        self.indexes[pos].take();
        Ok(previous)
    }

    /// Index of a field's values, built on first request in one pass.
    pub fn build_index<'f>(&self, field: impl Into<FieldRef<'f>>) -> StoreResult<&ValueIndex> {
        let pos = self.resolve(field.into())?;
        Ok(self.indexes[pos].get_or_init(|| {
            let idx = ValueIndex::build(&self.columns[pos]);
            tracing::trace!(field = %self.schema.fields[pos].label(), distinct = idx.len(), "index built");
            idx
        }))
    }

    /// First row whose `field` equals `value`, scanning in row order.
    pub fn find<'f>(&self, field: impl Into<FieldRef<'f>>, value: &Value) -> StoreResult<Option<RowView<'_>>> {
        let column = self.column(field)?;
        Ok(column
            .iter()
            .position(|v| v == value)
            .map(|i| RowView::new(i, &self.schema, &self.rows[i])))
    }

    /// All rows whose `field` equals `value`, in row order.
    pub fn find_all<'f>(&self, field: impl Into<FieldRef<'f>>, value: &Value) -> StoreResult<Vec<RowView<'_>>> {
        let column = self.column(field)?;
        Ok(column
            .iter()
            .enumerate()
            .filter(|(_, v)| *v == value)
            .map(|(i, _)| RowView::new(i, &self.schema, &self.rows[i]))
            .collect())
    }

    /// Row indexes partitioned by value, groups in first-seen order.
    pub fn group_by<'f>(&self, field: impl Into<FieldRef<'f>>) -> StoreResult<Vec<(&Value, &[usize])>> {
        Ok(self.build_index(field)?.iter().collect())
    }

    /// 1-based source line a row was parsed from (`None` for rows added directly).
    pub fn source_line(&self, row: usize) -> Option<usize> {
        self.source_lines.get(row).copied().flatten()
    }

    /// Recovered anomalies recorded while loading.
    pub fn load_warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    fn resolve(&self, field: FieldRef<'_>) -> StoreResult<usize> {
        self.schema.resolve(field).ok_or_else(|| match field {
            FieldRef::Position(index) => StoreError::FieldOutOfBounds {
                index,
                len: self.schema.len(),
            },
            _ => StoreError::UnknownField(field.to_string()),
        })
    }
}
