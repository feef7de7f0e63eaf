//! Row stores: where compiled queries are executed.
//!
//! The builder never talks to a database. A [`RowStore`] takes query text plus
//! positional values and returns rows. Every store recounts the placeholders in
//! the text and refuses to run when the count disagrees with the values.
//!
//! - PostgreSQL: `tokio_postgres::Client`, `tokio_postgres::Transaction` and
//!   (feature `pool`) `deadpool_postgres::Client`.
//! - [`MemoryStore`]: an in-memory table that understands the statements
//!   [`CompiledQuery::into_select`] produces.

mod memory;
mod postgres;

pub use memory::{MemoryRow, MemoryStore};

use crate::compiled::CompiledQuery;
use crate::error::{FilterError, FilterResult};
use crate::placeholder::PlaceholderStyle;
use crate::schema::TableSchema;
use crate::value::Value;

/// Executes query text with positional values.
pub trait RowStore: Send + Sync {
    /// Row type returned by this store.
    type Row: Send;

    /// Execute `text` with `values` bound positionally and return all rows.
    fn execute(
        &self,
        text: &str,
        values: &[Value],
    ) -> impl std::future::Future<Output = FilterResult<Vec<Self::Row>>> + Send;
}

/// Run `query` as `SELECT <columns> FROM <table> WHERE <predicate>`.
///
/// # Example
/// ```ignore
/// let mut qb = PredicateBuilder::all_of(schema.clone());
/// qb.add_condition("id", Op::Eq, 1, None)?;
/// qb.add_condition("likesCount", Op::Eq, 10, None)?;
/// let rows = pgfilter::fetch(&client, &schema, qb.build()?).await?;
/// ```
pub async fn fetch<S: RowStore>(
    store: &S,
    schema: &TableSchema,
    query: CompiledQuery,
) -> FilterResult<Vec<S::Row>> {
    let query = query.into_select(schema);
    store.execute(query.text(), query.values()).await
}

/// Fail with [`FilterError::PlaceholderMismatch`] unless `text` holds exactly
/// `values` placeholders of `style`.
pub fn check_placeholders(text: &str, values: usize, style: PlaceholderStyle) -> FilterResult<()> {
    let placeholders = style.count(text);
    if placeholders != values {
        tracing::warn!(
            target: "pgfilter.sql",
            placeholders,
            values,
            "refusing to execute: placeholder count mismatch"
        );
        return Err(FilterError::PlaceholderMismatch {
            placeholders,
            values,
        });
    }
    Ok(())
}
