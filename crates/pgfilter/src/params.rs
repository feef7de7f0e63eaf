//! Per-occurrence parameter storage.

use crate::value::Value;

/// Ordered placeholder -> value table.
///
/// Every push allocates the next positional index. There is no way to bind by
/// name, so two occurrences never share a slot, even when column and value
/// repeat.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamTable {
    values: Vec<Value>,
}

impl ParamTable {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Bind a value and return its 1-based index.
    pub fn push(&mut self, value: Value) -> usize {
        self.values.push(value);
        self.values.len()
    }

    /// Get the current parameter count.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Bound values in placeholder order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// `(index, value)` pairs, index 1-based.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Value)> {
        self.values.iter().enumerate().map(|(i, v)| (i + 1, v))
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}
