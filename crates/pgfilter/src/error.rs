//! Error types for pgfilter

use thiserror::Error;

/// Result type alias for pgfilter operations
pub type FilterResult<T> = Result<T, FilterError>;

/// Errors raised while building or executing a predicate.
#[derive(Debug, Error)]
pub enum FilterError {
    /// Column is not part of the table's allow-list
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// A second condition was added without stating AND or OR
    #[error("Ambiguous combinator: conditions after the first must specify AND or OR")]
    AmbiguousCombinator,

    /// The value shape does not match the operator
    #[error("Arity error for {operator}: {message}")]
    Arity {
        operator: &'static str,
        message: String,
    },

    /// `build()` was called with no conditions and without `match_all`
    #[error("Empty predicate: add a condition or use match_all")]
    EmptyPredicate,

    /// The builder was already finalized by `build()`
    #[error("Builder is finalized")]
    Finalized,

    /// Schema metadata declared a column name that is not a plain identifier
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Too many bound values for one statement
    #[error("Too many parameters: {got} exceeds limit of {limit}")]
    TooManyParams { limit: usize, got: usize },

    /// Query text and bound values disagree on the number of placeholders
    #[error("Placeholder mismatch: text has {placeholders} placeholders, got {values} values")]
    PlaceholderMismatch { placeholders: usize, values: usize },

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// In-memory store evaluation error
    #[error("Store error: {0}")]
    Store(String),
}

impl FilterError {
    /// Create an arity error for an operator
    pub fn arity(operator: &'static str, message: impl Into<String>) -> Self {
        Self::Arity {
            operator,
            message: message.into(),
        }
    }

    /// Create an in-memory store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    /// Check if this is an unknown column error
    pub fn is_unknown_column(&self) -> bool {
        matches!(self, Self::UnknownColumn(_))
    }

    /// Check if this is an ambiguous combinator error
    pub fn is_ambiguous_combinator(&self) -> bool {
        matches!(self, Self::AmbiguousCombinator)
    }

    /// Check if this is an arity error
    pub fn is_arity(&self) -> bool {
        matches!(self, Self::Arity { .. })
    }

    /// Check if this is an empty predicate error
    pub fn is_empty_predicate(&self) -> bool {
        matches!(self, Self::EmptyPredicate)
    }

    /// Check if this is a finalized error
    pub fn is_finalized(&self) -> bool {
        matches!(self, Self::Finalized)
    }

    /// Map a tokio_postgres error: a closed connection becomes
    /// [`FilterError::Connection`], anything else stays a [`FilterError::Query`].
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if err.is_closed() {
            return Self::Connection(err.to_string());
        }
        Self::Query(err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for FilterError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
