use crate::error::{StoreError, StoreResult};
use crate::types::{FieldRef, FromValue, Schema, Value};

/// Borrowed view of one stored row.
///
/// Values for schema fields come first, in schema order; retained extra source columns follow
/// and are reachable only by ordinal through [`RowView::extra`].
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    index: usize,
    schema: &'a Schema,
    values: &'a [Value],
}

impl<'a> RowView<'a> {
    pub(crate) fn new(index: usize, schema: &'a Schema, values: &'a [Value]) -> Self {
        Self {
            index,
            schema,
            values,
        }
    }

    /// Position of this row in the store.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Value of a schema field.
    pub fn get<'f>(&self, field: impl Into<FieldRef<'f>>) -> StoreResult<&'a Value> {
        let field = field.into();
        let pos = self
            .schema
            .resolve(field)
            .ok_or_else(|| StoreError::UnknownField(field.to_string()))?;
        Ok(&self.values[pos])
    }

    /// Typed value of a schema field; `Ok(None)` for null or non-convertible values.
    pub fn get_as<'f, T: FromValue>(&self, field: impl Into<FieldRef<'f>>) -> StoreResult<Option<T>> {
        self.get(field).map(T::from_value)
    }

    /// All values: schema fields, then extras.
    pub fn values(&self) -> &'a [Value] {
        self.values
    }

    /// Values of the schema fields, in schema order.
    pub fn fields(&self) -> &'a [Value] {
        &self.values[..self.schema.len()]
    }

    /// Source columns no schema field is bound to, in source order.
    pub fn extras(&self) -> &'a [Value] {
        &self.values[self.schema.len()..]
    }

    /// The `i`-th extra column.
    pub fn extra(&self, i: usize) -> Option<&'a Value> {
        self.extras().get(i)
    }
}

impl PartialEq for RowView<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.values == other.values
    }
}
