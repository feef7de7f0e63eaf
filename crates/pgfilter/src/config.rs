//! Builder configuration.
//!
//! [`BuilderConfig`] selects the placeholder syntax, caps the number of bound
//! values per query, and bounds how much SQL text reaches the `pgfilter.build`
//! and `pgfilter.sql` log targets.

use crate::placeholder::PlaceholderStyle;

/// PostgreSQL's limit on bind parameters per statement.
pub const PG_MAX_PARAMS: usize = 65535;

pub(crate) const DEFAULT_MAX_LOG_SQL_LENGTH: usize = 200;

/// Configuration for [`PredicateBuilder`](crate::PredicateBuilder).
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Placeholder syntax written into compiled text.
    pub placeholder_style: PlaceholderStyle,
    /// Maximum number of bound values per compiled query. `None` disables the check.
    pub max_params: Option<usize>,
    /// Truncate logged SQL (in bytes, cut at a char boundary). `None` logs it whole.
    pub max_log_sql_length: Option<usize>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            placeholder_style: PlaceholderStyle::Dollar,
            max_params: Some(PG_MAX_PARAMS),
            max_log_sql_length: Some(DEFAULT_MAX_LOG_SQL_LENGTH),
        }
    }
}

impl BuilderConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the placeholder syntax.
    pub fn placeholder_style(mut self, style: PlaceholderStyle) -> Self {
        self.placeholder_style = style;
        self
    }

    /// Set the maximum number of bound values.
    pub fn max_params(mut self, limit: usize) -> Self {
        self.max_params = Some(limit);
        self
    }

    /// Disable the bound value limit.
    pub fn unlimited_params(mut self) -> Self {
        self.max_params = None;
        self
    }

    /// Set maximum SQL length to log.
    pub fn max_log_sql_length(mut self, len: usize) -> Self {
        self.max_log_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation in logs.
    pub fn no_log_truncate(mut self) -> Self {
        self.max_log_sql_length = None;
        self
    }
}

/// Cut `sql` to at most `max` bytes without splitting a char, appending `...`.
pub(crate) fn truncate_for_log(sql: &str, max: Option<usize>) -> std::borrow::Cow<'_, str> {
    match max {
        Some(max) if sql.len() > max => {
            let mut end = max;
            while !sql.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &sql[..end]).into()
        }
        _ => sql.into(),
    }
}
