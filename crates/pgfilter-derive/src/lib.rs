//! Derive macros for pgfilter
//!
//! Provides `#[derive(TableMeta)]`, which turns a struct into a column allow-list.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod attrs;
mod sql_ident;
mod table_meta;

/// Derive `TableMeta` for a struct with named fields.
///
/// # Example
///
/// ```ignore
/// use pgfilter::TableMeta;
///
/// #[derive(TableMeta)]
/// #[orm(table = "post")]
/// struct Post {
///     #[orm(id)]
///     id: i64,
///     title: String,
///     #[orm(column = "likesCount")]
///     likes_count: i32,
///     #[orm(skip)]
///     cached_score: f64,
/// }
/// ```
///
/// # Attributes
///
/// - `#[orm(table = "name")]` on the struct; defaults to the snake_case struct name
/// - `#[orm(id)]` marks the primary key (at most one field)
/// - `#[orm(column = "name")]` maps a field to a different column name
/// - `#[orm(skip)]` keeps a field out of the allow-list
///
/// Every name must match `[A-Za-z_][A-Za-z0-9_]*`; anything else is a compile error.
#[proc_macro_derive(TableMeta, attributes(orm))]
pub fn derive_table_meta(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    table_meta::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
