//! Comparison operators and single-column conditions.
//!
//! A [`Condition`] is one `(column, operator, value)` triple. It never carries
//! SQL text: the column is resolved against the allow-list when the condition
//! is added to a builder, and every value becomes a placeholder.

use crate::error::{FilterError, FilterResult};
use crate::value::Operand;
use std::fmt;

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// Equal: column = value
    Eq,
    /// Not equal: column != value
    Ne,
    /// Less than: column < value
    Lt,
    /// Less than or equal: column <= value
    Lte,
    /// Greater than: column > value
    Gt,
    /// Greater than or equal: column >= value
    Gte,
    /// IN (list)
    In,
}

impl Op {
    /// The SQL token for this operator.
    pub fn as_sql(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::In => "IN",
        }
    }

    /// Whether the operator takes a list rather than a single scalar.
    pub fn takes_list(self) -> bool {
        matches!(self, Op::In)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// An immutable `(column, operator, value)` triple.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    column: String,
    op: Op,
    value: Operand,
}

impl Condition {
    /// Create a condition, checking that the value shape fits the operator.
    ///
    /// `IN` needs a non-empty list; every other operator needs exactly one scalar.
    /// The column is not checked here; the builder checks it against its allow-list.
    pub fn new(column: impl Into<String>, op: Op, value: impl Into<Operand>) -> FilterResult<Self> {
        let value = value.into();
        match (&value, op.takes_list()) {
            (Operand::List(values), true) if values.is_empty() => {
                return Err(FilterError::arity(op.as_sql(), "expected a non-empty list"));
            }
            (Operand::List(_), true) | (Operand::Scalar(_), false) => {}
            (Operand::Scalar(_), true) => {
                return Err(FilterError::arity(op.as_sql(), "expected a list, got a scalar"));
            }
            (Operand::List(values), false) => {
                return Err(FilterError::arity(
                    op.as_sql(),
                    format!("expected one scalar, got a list of {}", values.len()),
                ));
            }
        }
        Ok(Self {
            column: column.into(),
            op,
            value,
        })
    }

    /// Create an equality condition: column = value
    pub fn eq(column: impl Into<String>, value: impl Into<Operand>) -> FilterResult<Self> {
        Self::new(column, Op::Eq, value)
    }

    /// Create an inequality condition: column != value
    pub fn ne(column: impl Into<String>, value: impl Into<Operand>) -> FilterResult<Self> {
        Self::new(column, Op::Ne, value)
    }

    /// Create a less-than condition: column < value
    pub fn lt(column: impl Into<String>, value: impl Into<Operand>) -> FilterResult<Self> {
        Self::new(column, Op::Lt, value)
    }

    /// Create a less-than-or-equal condition: column <= value
    pub fn lte(column: impl Into<String>, value: impl Into<Operand>) -> FilterResult<Self> {
        Self::new(column, Op::Lte, value)
    }

    /// Create a greater-than condition: column > value
    pub fn gt(column: impl Into<String>, value: impl Into<Operand>) -> FilterResult<Self> {
        Self::new(column, Op::Gt, value)
    }

    /// Create a greater-than-or-equal condition: column >= value
    pub fn gte(column: impl Into<String>, value: impl Into<Operand>) -> FilterResult<Self> {
        Self::new(column, Op::Gte, value)
    }

    /// Create an IN condition: column IN (values...)
    pub fn in_list(column: impl Into<String>, values: impl Into<Operand>) -> FilterResult<Self> {
        Self::new(column, Op::In, values)
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn op(&self) -> Op {
        self.op
    }

    pub fn value(&self) -> &Operand {
        &self.value
    }
}
