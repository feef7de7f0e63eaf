//! The predicate builder.
//!
//! A [`PredicateBuilder`] collects `(column, operator, value)` triples for one
//! statement and compiles them into a [`CompiledQuery`]. It is built for a
//! single caller: create one per query, call `add_*`, then `build()` once.
//!
//! # Example
//!
//! ```ignore
//! use pgfilter::{Combinator, Op, PredicateBuilder, TableSchema};
//!
//! let schema = TableSchema::new("post", &["id", "title", "text", "likesCount"])?;
//! let mut qb = PredicateBuilder::new(schema);
//! qb.add_condition("id", Op::Gte, 4, None)?
//!     .add_condition("id", Op::Lte, 5, Some(Combinator::And))?;
//!
//! let q = qb.build()?;
//! assert_eq!(q.text(), r#""id" >= $1 AND "id" <= $2"#);
//! ```
//!
//! # States
//!
//! `Empty` (or `MatchAll`) -> `Accumulating` on the first condition ->
//! `Finalized` after a successful `build()`. Nothing can be added to, or built
//! from, a finalized builder.

use crate::compiled::CompiledQuery;
use crate::condition::{Condition, Op};
use crate::config::{BuilderConfig, truncate_for_log};
use crate::error::{FilterError, FilterResult};
use crate::params::ParamTable;
use crate::predicate::{Combinator, Predicate};
use crate::schema::TableSchema;
use crate::value::Operand;
use std::sync::Arc;

/// Lifecycle of a [`PredicateBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    /// No conditions yet; `build()` fails.
    Empty,
    /// No conditions yet; `build()` yields a predicate matching every row.
    MatchAll,
    /// At least one condition added.
    Accumulating,
    /// `build()` succeeded; the builder is frozen.
    Finalized,
}

/// Allow-listed, explicitly combined WHERE predicate builder.
#[derive(Debug, Clone)]
pub struct PredicateBuilder {
    schema: Arc<TableSchema>,
    config: BuilderConfig,
    default_combinator: Option<Combinator>,
    state: BuilderState,
    root: Option<Predicate>,
}

impl PredicateBuilder {
    /// Create a builder with no default combinator.
    ///
    /// Every condition after the first must name its combinator, otherwise
    /// [`FilterError::AmbiguousCombinator`] is returned.
    pub fn new(schema: impl Into<Arc<TableSchema>>) -> Self {
        Self {
            schema: schema.into(),
            config: BuilderConfig::default(),
            default_combinator: None,
            state: BuilderState::Empty,
            root: None,
        }
    }

    /// Create a builder whose conditions are ANDed unless a call says otherwise.
    pub fn all_of(schema: impl Into<Arc<TableSchema>>) -> Self {
        let mut qb = Self::new(schema);
        qb.default_combinator = Some(Combinator::And);
        qb
    }

    /// Create a builder whose conditions are ORed unless a call says otherwise.
    pub fn any_of(schema: impl Into<Arc<TableSchema>>) -> Self {
        let mut qb = Self::new(schema);
        qb.default_combinator = Some(Combinator::Or);
        qb
    }

    /// Create a builder that may be built with no conditions, matching every row.
    pub fn match_all(schema: impl Into<Arc<TableSchema>>) -> Self {
        let mut qb = Self::new(schema);
        qb.state = BuilderState::MatchAll;
        qb
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: BuilderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn state(&self) -> BuilderState {
        self.state
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// The predicate accumulated so far.
    pub fn predicate(&self) -> Option<&Predicate> {
        self.root.as_ref()
    }

    /// Add one condition.
    ///
    /// Checks, in order: the builder is not finalized, `column` is allow-listed,
    /// the value shape fits `op`, and a combinator is known when this is not
    /// the first condition. On error the builder is left unchanged.
    pub fn add_condition(
        &mut self,
        column: &str,
        op: Op,
        value: impl Into<Operand>,
        combinator: Option<Combinator>,
    ) -> FilterResult<&mut Self> {
        self.ensure_open()?;
        self.schema.column(column)?;
        let condition = Condition::new(column, op, value)?;
        self.push(Predicate::Condition(condition), combinator)
    }

    /// Add a condition combined with AND.
    pub fn and_where(
        &mut self,
        column: &str,
        op: Op,
        value: impl Into<Operand>,
    ) -> FilterResult<&mut Self> {
        self.add_condition(column, op, value, Some(Combinator::And))
    }

    /// Add a condition combined with OR.
    pub fn or_where(
        &mut self,
        column: &str,
        op: Op,
        value: impl Into<Operand>,
    ) -> FilterResult<&mut Self> {
        self.add_condition(column, op, value, Some(Combinator::Or))
    }

    /// Add a caller-built subtree such as `b OR c`.
    ///
    /// Every column in it is checked against the allow-list and empty groups
    /// are rejected. The subtree renders inside parentheses.
    pub fn add_predicate(
        &mut self,
        predicate: impl Into<Predicate>,
        combinator: Option<Combinator>,
    ) -> FilterResult<&mut Self> {
        self.ensure_open()?;
        let predicate = predicate.into();
        predicate.validate(&self.schema)?;
        self.push(predicate, combinator)
    }

    /// Compile the predicate and finalize the builder.
    ///
    /// One placeholder is emitted per value occurrence, left to right. A failed
    /// build leaves the builder in its previous state.
    pub fn build(&mut self) -> FilterResult<CompiledQuery> {
        let style = self.config.placeholder_style;
        let compiled = match (self.state, &self.root) {
            (BuilderState::Finalized, _) => return Err(FilterError::Finalized),
            (BuilderState::MatchAll, None) => {
                CompiledQuery::new("TRUE".to_string(), Vec::new(), style)
            }
            (_, None) => {
                tracing::warn!(
                    target: "pgfilter.build",
                    table = %self.schema.table(),
                    "build rejected: no conditions"
                );
                return Err(FilterError::EmptyPredicate);
            }
            (_, Some(root)) => {
                let got = root.param_count();
                if let Some(limit) = self.config.max_params.filter(|limit| got > *limit) {
                    tracing::warn!(
                        target: "pgfilter.build",
                        table = %self.schema.table(),
                        limit,
                        got,
                        "build rejected: too many parameters"
                    );
                    return Err(FilterError::TooManyParams { limit, got });
                }

                let mut params = ParamTable::new();
                let mut text = String::new();
                root.render(&self.schema, style, &mut params, &mut text)?;
                CompiledQuery::new(text, params.into_values(), style)
            }
        };

        debug_assert_eq!(compiled.placeholder_count(), compiled.values().len());

        self.state = BuilderState::Finalized;
        tracing::debug!(
            target: "pgfilter.build",
            table = %self.schema.table(),
            param_count = compiled.values().len(),
            text = %truncate_for_log(compiled.text(), self.config.max_log_sql_length),
            "predicate built"
        );
        Ok(compiled)
    }

    fn ensure_open(&self) -> FilterResult<()> {
        if self.state == BuilderState::Finalized {
            return Err(FilterError::Finalized);
        }
        Ok(())
    }

    fn push(
        &mut self,
        node: Predicate,
        combinator: Option<Combinator>,
    ) -> FilterResult<&mut Self> {
        let combinator = combinator.or(self.default_combinator);
        let root = match self.root.take() {
            None => Predicate::Group {
                combinator: combinator.unwrap_or(Combinator::And),
                children: vec![node],
            },
            Some(root) => match combinator {
                Some(combinator) => root.combine(combinator, node),
                None => {
                    self.root = Some(root);
                    return Err(FilterError::AmbiguousCombinator);
                }
            },
        };
        self.root = Some(root);
        if self.state != BuilderState::Accumulating {
            tracing::trace!(
                target: "pgfilter.build",
                from = ?self.state,
                "builder accumulating"
            );
            self.state = BuilderState::Accumulating;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests;
