//! PostgreSQL row stores.

use super::{RowStore, check_placeholders};
use crate::compiled::to_sql_refs;
use crate::config::{DEFAULT_MAX_LOG_SQL_LENGTH, truncate_for_log};
use crate::error::{FilterError, FilterResult};
use crate::placeholder::PlaceholderStyle;
use crate::value::Value;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

fn prepare<'a>(text: &str, values: &'a [Value]) -> FilterResult<Vec<&'a (dyn ToSql + Sync)>> {
    check_placeholders(text, values.len(), PlaceholderStyle::Dollar)?;
    tracing::debug!(
        target: "pgfilter.sql",
        param_count = values.len(),
        sql = %truncate_for_log(text, Some(DEFAULT_MAX_LOG_SQL_LENGTH)),
        "executing"
    );
    Ok(to_sql_refs(values))
}

impl RowStore for tokio_postgres::Client {
    type Row = Row;

    async fn execute(&self, text: &str, values: &[Value]) -> FilterResult<Vec<Row>> {
        let params = prepare(text, values)?;
        tokio_postgres::Client::query(self, text, &params)
            .await
            .map_err(FilterError::from_db_error)
    }
}

impl RowStore for tokio_postgres::Transaction<'_> {
    type Row = Row;

    async fn execute(&self, text: &str, values: &[Value]) -> FilterResult<Vec<Row>> {
        let params = prepare(text, values)?;
        tokio_postgres::Transaction::query(self, text, &params)
            .await
            .map_err(FilterError::from_db_error)
    }
}

// ===== deadpool-postgres support =====

#[cfg(feature = "pool")]
impl RowStore for deadpool_postgres::Client {
    type Row = Row;

    async fn execute(&self, text: &str, values: &[Value]) -> FilterResult<Vec<Row>> {
        // Delegate to the deref target (ClientWrapper -> tokio_postgres::Client).
        let client: &tokio_postgres::Client = self;
        RowStore::execute(client, text, values).await
    }
}
