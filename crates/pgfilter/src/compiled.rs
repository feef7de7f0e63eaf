//! The output of [`PredicateBuilder::build`](crate::PredicateBuilder::build).

use crate::placeholder::PlaceholderStyle;
use crate::schema::TableSchema;
use crate::value::Value;
use tokio_postgres::types::ToSql;

/// Query text with positional placeholders plus the values bound to them.
///
/// `values[i]` belongs to placeholder `i + 1`. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct CompiledQuery {
    text: String,
    values: Vec<Value>,
    style: PlaceholderStyle,
}

impl CompiledQuery {
    pub(crate) fn new(text: String, values: Vec<Value>, style: PlaceholderStyle) -> Self {
        Self {
            text,
            values,
            style,
        }
    }

    /// The query text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Bound values in placeholder order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn placeholder_style(&self) -> PlaceholderStyle {
        self.style
    }

    /// Placeholders actually present in the text.
    pub fn placeholder_count(&self) -> usize {
        self.style.count(&self.text)
    }

    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        to_sql_refs(&self.values)
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.text, self.values)
    }

    /// Wrap the predicate into a full statement:
    /// `SELECT <columns> FROM <table> WHERE <predicate>`.
    ///
    /// Only identifiers from `schema` are added; values are untouched.
    pub fn into_select(self, schema: &TableSchema) -> CompiledQuery {
        let mut sql = String::with_capacity(self.text.len() + 64);
        sql.push_str("SELECT ");
        for (i, col) in schema.columns().iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            col.write_sql(&mut sql);
        }
        sql.push_str(" FROM ");
        schema.table().write_sql(&mut sql);
        sql.push_str(" WHERE ");
        sql.push_str(&self.text);
        CompiledQuery::new(sql, self.values, self.style)
    }
}

pub(crate) fn to_sql_refs(values: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    values.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}
