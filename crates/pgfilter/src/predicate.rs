//! Predicate trees.
//!
//! A [`Predicate`] is either one [`Condition`] or an explicit AND/OR group of
//! sub-predicates. Nested groups always render inside parentheses, so the
//! output never depends on SQL operator precedence.

use crate::condition::Condition;
use crate::error::{FilterError, FilterResult};
use crate::params::ParamTable;
use crate::placeholder::PlaceholderStyle;
use crate::schema::TableSchema;
use crate::value::Operand;
use std::fmt;

/// How sibling predicates are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    fn separator(self) -> &'static str {
        match self {
            Combinator::And => " AND ",
            Combinator::Or => " OR ",
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.separator().trim())
    }
}

/// A tree of conditions joined by explicit combinators.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// A single condition.
    Condition(Condition),
    /// All children combined by one combinator.
    Group {
        combinator: Combinator,
        children: Vec<Predicate>,
    },
}

impl Predicate {
    /// AND group.
    pub fn all(children: impl IntoIterator<Item = Predicate>) -> Self {
        Predicate::Group {
            combinator: Combinator::And,
            children: children.into_iter().collect(),
        }
    }

    /// OR group.
    pub fn any(children: impl IntoIterator<Item = Predicate>) -> Self {
        Predicate::Group {
            combinator: Combinator::Or,
            children: children.into_iter().collect(),
        }
    }

    /// Combine `self` with `next` under `combinator`.
    ///
    /// Groups are extended when they already use `combinator` (or hold a single
    /// child); otherwise `self` becomes the left operand of a new group. This
    /// keeps chains left-associative: `a AND b OR c` is `(a AND b) OR c`.
    pub fn combine(self, combinator: Combinator, next: Predicate) -> Self {
        match self {
            Predicate::Group {
                combinator: current,
                mut children,
            } if current == combinator || children.len() == 1 => {
                children.push(next);
                Predicate::Group {
                    combinator,
                    children,
                }
            }
            other => Predicate::Group {
                combinator,
                children: vec![other, next],
            },
        }
    }

    /// Visit every condition, left to right.
    pub fn conditions(&self) -> Vec<&Condition> {
        let mut out = Vec::new();
        self.collect_conditions(&mut out);
        out
    }

    fn collect_conditions<'a>(&'a self, out: &mut Vec<&'a Condition>) {
        match self {
            Predicate::Condition(c) => out.push(c),
            Predicate::Group { children, .. } => {
                for child in children {
                    child.collect_conditions(out);
                }
            }
        }
    }

    /// Number of placeholders this tree will emit.
    pub fn param_count(&self) -> usize {
        self.conditions().iter().map(|c| c.value().len()).sum()
    }

    /// Check every column against `schema` and reject empty groups.
    pub(crate) fn validate(&self, schema: &TableSchema) -> FilterResult<()> {
        match self {
            Predicate::Condition(c) => schema.column(c.column()).map(|_| ()),
            Predicate::Group { children, .. } => {
                if children.is_empty() {
                    return Err(FilterError::EmptyPredicate);
                }
                children.iter().try_for_each(|child| child.validate(schema))
            }
        }
    }

    /// Render into `out`, binding each value occurrence into `params`.
    ///
    /// Column names are taken from `schema`, never from the condition itself.
    pub(crate) fn render(
        &self,
        schema: &TableSchema,
        style: PlaceholderStyle,
        params: &mut ParamTable,
        out: &mut String,
    ) -> FilterResult<()> {
        match self {
            Predicate::Condition(c) => render_condition(c, schema, style, params, out),
            Predicate::Group {
                combinator,
                children,
            } => {
                if children.is_empty() {
                    return Err(FilterError::EmptyPredicate);
                }
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        out.push_str(combinator.separator());
                    }
                    let wrap = child.is_compound();
                    if wrap {
                        out.push('(');
                    }
                    child.render(schema, style, params, out)?;
                    if wrap {
                        out.push(')');
                    }
                }
                Ok(())
            }
        }
    }

    // A single-child group delegates wrapping to its child.
    fn is_compound(&self) -> bool {
        matches!(self, Predicate::Group { children, .. } if children.len() > 1)
    }
}

impl From<Condition> for Predicate {
    fn from(condition: Condition) -> Self {
        Predicate::Condition(condition)
    }
}

fn render_condition(
    condition: &Condition,
    schema: &TableSchema,
    style: PlaceholderStyle,
    params: &mut ParamTable,
    out: &mut String,
) -> FilterResult<()> {
    let column = schema.column(condition.column())?;
    column.write_sql(out);
    out.push(' ');
    out.push_str(condition.op().as_sql());
    out.push(' ');
    match condition.value() {
        Operand::Scalar(v) => {
            let idx = params.push(v.clone());
            style.write(out, idx);
        }
        Operand::List(values) => {
            out.push('(');
            for (i, v) in values.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                let idx = params.push(v.clone());
                style.write(out, idx);
            }
            out.push(')');
        }
    }
    Ok(())
}
