//! Table metadata and the column allow-list.
//!
//! A [`TableSchema`] is the closed set of columns a
//! [`PredicateBuilder`](crate::PredicateBuilder) accepts. Build one by hand with
//! [`TableSchema::new`], or from any type implementing [`TableMeta`]
//! (usually via `#[derive(TableMeta)]`).
//!
//! # Example
//!
//! ```ignore
//! use pgfilter::{TableMeta, TableSchema};
//!
//! #[derive(TableMeta)]
//! #[orm(table = "post")]
//! struct Post {
//!     #[orm(id)]
//!     id: i32,
//!     title: String,
//!     text: String,
//!     #[orm(column = "likesCount")]
//!     likes_count: i32,
//! }
//!
//! let schema = TableSchema::from_meta::<Post>()?;
//! assert!(schema.has_column("likesCount"));
//! ```

use crate::error::{FilterError, FilterResult};
use crate::ident::Ident;

/// Metadata for a database table.
///
/// This trait is implemented by `#[derive(TableMeta)]`.
pub trait TableMeta {
    /// The database table name.
    fn table_name() -> &'static str;

    /// List of column names in this table.
    fn columns() -> &'static [&'static str];

    /// The primary key column name, if any.
    fn primary_key() -> Option<&'static str> {
        None
    }
}

/// A table name plus its allow-listed columns.
///
/// Immutable after construction; share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    table: Ident,
    columns: Vec<Ident>,
    primary_key: Option<Ident>,
}

impl TableSchema {
    /// Create a schema, validating every name.
    ///
    /// Duplicate columns are rejected.
    pub fn new(table: &str, columns: &[&str]) -> FilterResult<Self> {
        let table = Ident::new(table)?;
        let mut idents: Vec<Ident> = Vec::with_capacity(columns.len());
        for col in columns {
            let ident = Ident::new(col)?;
            if idents.contains(&ident) {
                return Err(FilterError::InvalidIdentifier(format!(
                    "duplicate column '{col}' in table '{table}'"
                )));
            }
            idents.push(ident);
        }
        if idents.is_empty() {
            return Err(FilterError::InvalidIdentifier(format!(
                "table '{table}' declares no columns"
            )));
        }
        Ok(Self {
            table,
            columns: idents,
            primary_key: None,
        })
    }

    /// Create a schema from a type implementing [`TableMeta`].
    pub fn from_meta<T: TableMeta>() -> FilterResult<Self> {
        let schema = Self::new(T::table_name(), T::columns())?;
        match T::primary_key() {
            Some(pk) => schema.with_primary_key(pk),
            None => Ok(schema),
        }
    }

    /// Mark an existing column as the primary key.
    pub fn with_primary_key(mut self, pk: &str) -> FilterResult<Self> {
        let ident = self.column(pk)?.clone();
        self.primary_key = Some(ident);
        Ok(self)
    }

    /// The table identifier.
    pub fn table(&self) -> &Ident {
        &self.table
    }

    /// All allow-listed columns, in declaration order.
    pub fn columns(&self) -> &[Ident] {
        &self.columns
    }

    /// The primary key column, if declared.
    pub fn primary_key(&self) -> Option<&Ident> {
        self.primary_key.as_ref()
    }

    /// Look up an allow-listed column by exact name.
    pub fn column(&self, name: &str) -> FilterResult<&Ident> {
        self.columns
            .iter()
            .find(|c| c.as_str() == name)
            .ok_or_else(|| FilterError::UnknownColumn(name.to_string()))
    }

    /// Check if this table has a column with the given name.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.as_str() == name)
    }
}
