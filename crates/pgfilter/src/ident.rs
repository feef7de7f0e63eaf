//! Validated SQL identifiers.
//!
//! [`Ident`] is the only way a table or column name reaches query text.
//! Names must match `[A-Za-z_][A-Za-z0-9_]*` and are always rendered
//! double-quoted, so mixed-case names such as `likesCount` keep their case
//! in PostgreSQL.
//!
//! # Example
//! ```ignore
//! use pgfilter::Ident;
//!
//! let c = Ident::new("likesCount")?;
//! assert_eq!(c.to_sql(), r#""likesCount""#);
//! # Ok::<(), pgfilter::FilterError>(())
//! ```

use crate::error::{FilterError, FilterResult};
use std::fmt;

/// A single table or column name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ident(String);

impl Ident {
    /// Validate `name` as a plain identifier.
    pub fn new(name: &str) -> FilterResult<Self> {
        let mut chars = name.chars();
        let Some(first) = chars.next() else {
            return Err(FilterError::InvalidIdentifier(
                "identifier cannot be empty".to_string(),
            ));
        };
        if !(first == '_' || first.is_ascii_alphabetic()) {
            return Err(FilterError::InvalidIdentifier(format!(
                "invalid identifier start character '{first}' in '{name}'"
            )));
        }
        if let Some(c) = chars.find(|c| !(*c == '_' || c.is_ascii_alphanumeric())) {
            return Err(FilterError::InvalidIdentifier(format!(
                "invalid character '{c}' in '{name}'"
            )));
        }
        Ok(Self(name.to_string()))
    }

    /// The bare name, without quotes.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render the identifier as SQL (`"name"`).
    pub fn to_sql(&self) -> String {
        let mut out = String::with_capacity(self.0.len() + 2);
        self.write_sql(&mut out);
        out
    }

    // Validation rejects '"', so no escaping is needed.
    pub(crate) fn write_sql(&self, out: &mut String) {
        out.push('"');
        out.push_str(&self.0);
        out.push('"');
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Ident {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
