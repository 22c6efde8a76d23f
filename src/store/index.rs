//! Value -> row position index.

use indexmap::IndexMap;

use crate::types::Value;

/// Multi-map from each distinct [`Value`] of a column to the rows holding it.
///
/// Keys keep first-seen order; each position list is ascending, because it is built in one
/// pass over the column in row order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueIndex {
    positions: IndexMap<Value, Vec<usize>>,
}

impl ValueIndex {
    /// Build an index over `column`.
    pub fn build(column: &[Value]) -> Self {
        let mut positions: IndexMap<Value, Vec<usize>> = IndexMap::new();
        for (row, value) in column.iter().enumerate() {
            positions.entry(value.clone()).or_default().push(row);
        }
        Self { positions }
    }

    /// Rows holding `value` (empty when absent).
    pub fn get(&self, value: &Value) -> &[usize] {
        self.positions.get(value).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.positions.contains_key(value)
    }

    /// Number of distinct values (null counts as one).
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Groups in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &[usize])> {
        self.positions.iter().map(|(v, rows)| (v, rows.as_slice()))
    }

    /// Non-null values held by more than one row.
    pub fn duplicates(&self) -> impl Iterator<Item = (&Value, &[usize])> {
        self.iter()
            .filter(|(v, rows)| !v.is_null() && rows.len() > 1)
    }
}
