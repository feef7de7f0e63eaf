//! # pgfilter
//!
//! Injection-safe WHERE predicates for PostgreSQL.
//!
//! ## Features
//!
//! - **Allow-listed columns**: every column reference is checked against a
//!   [`TableSchema`] before it can reach SQL text; identifiers are always quoted
//! - **Values are never SQL**: values travel as positional parameters only
//! - **Explicit combinators**: AND/OR is stated per condition or set once per builder;
//!   two conditions never combine silently
//! - **One placeholder per value**: conditions on the same column never share a slot
//! - **Pluggable execution**: run compiled predicates on `tokio_postgres`,
//!   a deadpool connection, or the in-memory [`MemoryStore`]
//!
//! ## Example
//!
//! ```ignore
//! use pgfilter::{Op, PredicateBuilder, TableMeta, TableSchema};
//!
//! #[derive(TableMeta)]
//! #[orm(table = "post")]
//! struct Post {
//!     #[orm(id)]
//!     id: i64,
//!     title: String,
//!     text: String,
//!     #[orm(column = "likesCount")]
//!     likes_count: i32,
//! }
//!
//! let schema = TableSchema::from_meta::<Post>()?;
//! let mut qb = PredicateBuilder::all_of(schema.clone());
//! qb.add_condition("id", Op::Eq, 1, None)?;
//! qb.add_condition("likesCount", Op::Eq, 10, None)?;
//!
//! let query = qb.build()?;
//! assert_eq!(query.text(), r#""id" = $1 AND "likesCount" = $2"#);
//!
//! let rows = pgfilter::fetch(&client, &schema, query).await?;
//! ```

pub mod builder;
pub mod compiled;
pub mod condition;
pub mod config;
pub mod error;
pub mod ident;
pub mod params;
pub mod placeholder;
pub mod predicate;
pub mod schema;
pub mod store;
pub mod value;

pub use builder::{BuilderState, PredicateBuilder};
pub use compiled::CompiledQuery;
pub use condition::{Condition, Op};
pub use config::{BuilderConfig, PG_MAX_PARAMS};
pub use error::{FilterError, FilterResult};
pub use ident::Ident;
pub use params::ParamTable;
pub use placeholder::PlaceholderStyle;
pub use predicate::{Combinator, Predicate};
pub use schema::{TableMeta, TableSchema};
pub use store::{MemoryRow, MemoryStore, RowStore, check_placeholders, fetch};
pub use value::{Operand, Value};

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{PoolConfig, create_pool, create_pool_with_config};

#[cfg(feature = "derive")]
pub use pgfilter_derive::TableMeta;
