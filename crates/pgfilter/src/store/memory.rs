//! In-memory row store.
//!
//! Statements are parsed with `sqlparser` and evaluated row by row against a
//! single table. Supported: `SELECT <columns | *> FROM <table> [WHERE ...]`
//! where the WHERE clause is built from comparisons, `IN`, `BETWEEN`,
//! `IS [NOT] NULL`, `NOT`, `AND`/`OR`, literals, casts and placeholders.
//! Placeholders are `$n` or `?`, never both in one statement.
//!
//! A missing cell is SQL NULL: comparisons with it are unknown and AND/OR use
//! three-valued logic. Casts are accepted and evaluate to their operand.

use super::RowStore;
use crate::config::{DEFAULT_MAX_LOG_SQL_LENGTH, truncate_for_log};
use crate::error::{FilterError, FilterResult};
use crate::placeholder::PlaceholderStyle;
use crate::schema::TableSchema;
use crate::value::Value;
use sqlparser::ast::{
    BinaryOperator, Expr, Ident, Query, Select, SelectItem, SetExpr, Statement, TableFactor,
    UnaryOperator, Value as SqlValue,
};
use sqlparser::dialect::{GenericDialect, PostgreSqlDialect};
use sqlparser::parser::Parser;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// A row keyed by column name.
pub type MemoryRow = BTreeMap<String, Value>;

/// A single in-memory table guarded by its allow-list.
#[derive(Debug)]
pub struct MemoryStore {
    schema: Arc<TableSchema>,
    rows: RwLock<Vec<MemoryRow>>,
}

impl MemoryStore {
    /// Create an empty table for `schema`.
    pub fn new(schema: impl Into<Arc<TableSchema>>) -> Self {
        Self {
            schema: schema.into(),
            rows: RwLock::new(Vec::new()),
        }
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Insert a row. Every key must be an allow-listed column.
    pub fn insert<K: Into<String>>(
        &self,
        row: impl IntoIterator<Item = (K, Value)>,
    ) -> FilterResult<()> {
        let mut cells = MemoryRow::new();
        for (column, value) in row {
            let column = column.into();
            self.schema.column(&column)?;
            cells.insert(column, value);
        }
        self.rows.write().map_err(|_| poisoned())?.push(cells);
        Ok(())
    }

    /// Number of stored rows.
    pub fn len(&self) -> FilterResult<usize> {
        Ok(self.rows.read().map_err(|_| poisoned())?.len())
    }

    pub fn is_empty(&self) -> FilterResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Execute synchronously.
    pub fn query(&self, text: &str, values: &[Value]) -> FilterResult<Vec<MemoryRow>> {
        tracing::debug!(
            target: "pgfilter.sql",
            param_count = values.len(),
            sql = %truncate_for_log(text, Some(DEFAULT_MAX_LOG_SQL_LENGTH)),
            "executing in memory"
        );

        let plan = self.plan(text)?;
        plan.check_params(values.len())?;

        let rows = self.rows.read().map_err(|_| poisoned())?;
        let mut out = Vec::new();
        for cells in rows.iter() {
            let row = RowContext { cells, values };
            let selected = match &plan.filter {
                Some(filter) => row.truth(filter)? == Some(true),
                None => true,
            };
            if selected {
                out.push(project(cells, &plan.columns));
            }
        }
        Ok(out)
    }

    /// Parse `text` and check every name and placeholder in it.
    fn plan(&self, text: &str) -> FilterResult<Plan> {
        // `?` is a JSON operator to the PostgreSQL dialect.
        let parsed = if PlaceholderStyle::Question.count(text) > 0 {
            Parser::parse_sql(&GenericDialect {}, text)
        } else {
            Parser::parse_sql(&PostgreSqlDialect {}, text)
        };
        let mut statements =
            parsed.map_err(|e| FilterError::store(format!("cannot parse statement: {e}")))?;

        if statements.len() != 1 {
            return Err(FilterError::store(format!(
                "expected exactly one statement, got {}",
                statements.len()
            )));
        }
        let Some(Statement::Query(query)) = statements.pop() else {
            return Err(FilterError::store("only SELECT statements are supported"));
        };
        let Select {
            projection,
            from,
            selection,
            distinct,
            ..
        } = plain_select(*query)?;

        if distinct.is_some() {
            return Err(FilterError::store("DISTINCT is not supported"));
        }
        let [table] = from.as_slice() else {
            return Err(FilterError::store("expected exactly one table in FROM"));
        };
        if !table.joins.is_empty() {
            return Err(FilterError::store("joins are not supported"));
        }
        let TableFactor::Table { name, .. } = &table.relation else {
            return Err(FilterError::store("FROM must name a table"));
        };
        let name = name.to_string();
        let expected = self.schema.table();
        if name != expected.to_sql() && name != expected.as_str() {
            return Err(FilterError::store(format!("unknown table '{name}'")));
        }

        let mut columns = Vec::new();
        for item in &projection {
            match item {
                SelectItem::Wildcard(_) => columns.extend(
                    self.schema
                        .columns()
                        .iter()
                        .map(|c| c.as_str().to_string()),
                ),
                SelectItem::UnnamedExpr(Expr::Identifier(ident)) => {
                    let column = column_name(ident);
                    self.schema.column(&column)?;
                    columns.push(column);
                }
                other => {
                    return Err(FilterError::store(format!(
                        "unsupported select item: {other}"
                    )));
                }
            }
        }

        let mut binder = Binder::default();
        let filter = match selection {
            Some(mut expr) => {
                binder.visit(&mut expr, &self.schema)?;
                Some(expr)
            }
            None => None,
        };

        Ok(Plan {
            columns,
            filter,
            placeholders: binder.occurrences,
            highest: binder.highest,
        })
    }
}

impl RowStore for MemoryStore {
    type Row = MemoryRow;

    async fn execute(&self, text: &str, values: &[Value]) -> FilterResult<Vec<MemoryRow>> {
        self.query(text, values)
    }
}

fn poisoned() -> FilterError {
    FilterError::store("row lock poisoned")
}

fn project(row: &MemoryRow, columns: &[String]) -> MemoryRow {
    columns
        .iter()
        .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
        .collect()
}

fn plain_select(query: Query) -> FilterResult<Select> {
    if query.with.is_some() || query.order_by.is_some() || query.limit_clause.is_some() {
        return Err(FilterError::store(
            "WITH, ORDER BY and LIMIT are not supported",
        ));
    }
    match *query.body {
        SetExpr::Select(select) => Ok(*select),
        other => Err(FilterError::store(format!(
            "only a plain SELECT is supported, got: {other}"
        ))),
    }
}

/// Unquoted identifiers fold to lower case, as in PostgreSQL.
fn column_name(ident: &Ident) -> String {
    match ident.quote_style {
        Some(_) => ident.value.clone(),
        None => ident.value.to_lowercase(),
    }
}

fn unsupported(expr: &Expr) -> FilterError {
    FilterError::store(format!("unsupported expression: {expr}"))
}

/// A parsed, checked statement.
#[derive(Debug)]
struct Plan {
    columns: Vec<String>,
    filter: Option<Expr>,
    placeholders: usize,
    highest: usize,
}

impl Plan {
    fn check_params(&self, values: usize) -> FilterResult<()> {
        if self.placeholders != values {
            return Err(FilterError::PlaceholderMismatch {
                placeholders: self.placeholders,
                values,
            });
        }
        if self.highest > values {
            return Err(FilterError::store(format!(
                "placeholder ${} has no bound value",
                self.highest
            )));
        }
        Ok(())
    }
}

// ==================== Binding ====================

/// Checks columns against the allow-list and rewrites every placeholder to
/// its 1-based `$n` form, counting occurrences in text order.
#[derive(Debug, Default)]
struct Binder {
    style: Option<PlaceholderStyle>,
    positional: usize,
    occurrences: usize,
    highest: usize,
}

impl Binder {
    fn visit(&mut self, expr: &mut Expr, schema: &TableSchema) -> FilterResult<()> {
        match expr {
            Expr::Identifier(ident) => schema.column(&column_name(ident)).map(|_| ()),
            Expr::Value(v) => {
                if let SqlValue::Placeholder(raw) = &mut v.value {
                    *raw = self.resolve(raw)?;
                }
                Ok(())
            }
            Expr::BinaryOp { left, right, .. } => {
                self.visit(left, schema)?;
                self.visit(right, schema)
            }
            Expr::UnaryOp { op, expr: inner } => match op {
                UnaryOperator::Not | UnaryOperator::Minus | UnaryOperator::Plus => {
                    self.visit(inner, schema)
                }
                _ => Err(FilterError::store(format!("unsupported operator {op}"))),
            },
            Expr::Nested(inner)
            | Expr::IsNull(inner)
            | Expr::IsNotNull(inner)
            | Expr::Cast { expr: inner, .. } => self.visit(inner, schema),
            Expr::InList { expr: inner, list, .. } => {
                self.visit(inner, schema)?;
                list.iter_mut().try_for_each(|item| self.visit(item, schema))
            }
            Expr::Between {
                expr: inner,
                low,
                high,
                ..
            } => {
                self.visit(inner, schema)?;
                self.visit(low, schema)?;
                self.visit(high, schema)
            }
            other => Err(unsupported(other)),
        }
    }

    fn resolve(&mut self, raw: &str) -> FilterResult<String> {
        let (style, index) = if let Some(digits) = raw.strip_prefix('$') {
            (PlaceholderStyle::Dollar, placeholder_index(raw, digits)?)
        } else if let Some(digits) = raw.strip_prefix('?') {
            let index = if digits.is_empty() {
                self.positional + 1
            } else {
                placeholder_index(raw, digits)?
            };
            self.positional = index;
            (PlaceholderStyle::Question, index)
        } else {
            return Err(FilterError::store(format!("unsupported placeholder '{raw}'")));
        };

        match self.style {
            Some(seen) if seen != style => {
                return Err(FilterError::store("mixed placeholder styles"));
            }
            _ => self.style = Some(style),
        }
        self.occurrences += 1;
        self.highest = self.highest.max(index);
        Ok(format!("${index}"))
    }
}

fn placeholder_index(raw: &str, digits: &str) -> FilterResult<usize> {
    match digits.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(FilterError::store(format!("invalid placeholder '{raw}'"))),
    }
}

// ==================== Evaluation ====================

struct RowContext<'a> {
    cells: &'a MemoryRow,
    values: &'a [Value],
}

impl RowContext<'_> {
    /// Evaluate a condition; `None` is SQL's unknown.
    fn truth(&self, expr: &Expr) -> FilterResult<Option<bool>> {
        match expr {
            Expr::BinaryOp {
                left,
                op: BinaryOperator::And,
                right,
            } => {
                let l = self.truth(left)?;
                if l == Some(false) {
                    return Ok(l);
                }
                Ok(and(l, self.truth(right)?))
            }
            Expr::BinaryOp {
                left,
                op: BinaryOperator::Or,
                right,
            } => {
                let l = self.truth(left)?;
                if l == Some(true) {
                    return Ok(l);
                }
                Ok(or(l, self.truth(right)?))
            }
            Expr::BinaryOp { left, op, right } => {
                let (Some(l), Some(r)) = (self.scalar(left)?, self.scalar(right)?) else {
                    return Ok(None);
                };
                let ord = compare(&l, &r)?;
                let hit = match op {
                    BinaryOperator::Eq => ord == Ordering::Equal,
                    BinaryOperator::NotEq => ord != Ordering::Equal,
                    BinaryOperator::Lt => ord == Ordering::Less,
                    BinaryOperator::LtEq => ord != Ordering::Greater,
                    BinaryOperator::Gt => ord == Ordering::Greater,
                    BinaryOperator::GtEq => ord != Ordering::Less,
                    other => {
                        return Err(FilterError::store(format!(
                            "unsupported operator {other}"
                        )));
                    }
                };
                Ok(Some(hit))
            }
            Expr::Nested(inner) => self.truth(inner),
            Expr::UnaryOp {
                op: UnaryOperator::Not,
                expr: inner,
            } => Ok(self.truth(inner)?.map(|b| !b)),
            Expr::IsNull(inner) => Ok(Some(self.scalar(inner)?.is_none())),
            Expr::IsNotNull(inner) => Ok(Some(self.scalar(inner)?.is_some())),
            Expr::InList {
                expr: inner,
                list,
                negated,
            } => {
                let Some(needle) = self.scalar(inner)? else {
                    return Ok(None);
                };
                let mut saw_null = false;
                for item in list {
                    match self.scalar(item)? {
                        Some(v) if compare(&needle, &v)? == Ordering::Equal => {
                            return Ok(Some(!negated));
                        }
                        Some(_) => {}
                        None => saw_null = true,
                    }
                }
                Ok(if saw_null { None } else { Some(*negated) })
            }
            Expr::Between {
                expr: inner,
                negated,
                low,
                high,
            } => {
                let v = self.scalar(inner)?;
                let above = self.ordered(&v, low)?.map(|o| o != Ordering::Less);
                let below = self.ordered(&v, high)?.map(|o| o != Ordering::Greater);
                Ok(and(above, below).map(|b| b != *negated))
            }
            other => match self.scalar(other)? {
                Some(Value::Bool(b)) => Ok(Some(b)),
                None => Ok(None),
                Some(v) => Err(FilterError::store(format!(
                    "expected a boolean condition, got {} value",
                    v.kind()
                ))),
            },
        }
    }

    /// Evaluate a scalar; `None` is SQL NULL.
    fn scalar(&self, expr: &Expr) -> FilterResult<Option<Value>> {
        match expr {
            Expr::Identifier(ident) => Ok(self.cells.get(&column_name(ident)).cloned()),
            Expr::Value(v) => self.literal(&v.value),
            Expr::Nested(inner) | Expr::Cast { expr: inner, .. } => self.scalar(inner),
            Expr::UnaryOp {
                op: UnaryOperator::Plus,
                expr: inner,
            } => self.scalar(inner),
            Expr::UnaryOp {
                op: UnaryOperator::Minus,
                expr: inner,
            } => match self.scalar(inner)? {
                Some(Value::Int(i)) => i
                    .checked_neg()
                    .map(|n| Some(Value::Int(n)))
                    .ok_or_else(|| FilterError::store("integer out of range")),
                Some(Value::Float(f)) => Ok(Some(Value::Float(-f))),
                None => Ok(None),
                Some(v) => Err(FilterError::store(format!("cannot negate {} value", v.kind()))),
            },
            Expr::BinaryOp { .. }
            | Expr::UnaryOp { .. }
            | Expr::IsNull(_)
            | Expr::IsNotNull(_)
            | Expr::InList { .. }
            | Expr::Between { .. } => Ok(self.truth(expr)?.map(Value::Bool)),
            other => Err(unsupported(other)),
        }
    }

    fn literal(&self, value: &SqlValue) -> FilterResult<Option<Value>> {
        match value {
            SqlValue::Number(raw, _) => raw
                .parse::<i64>()
                .map(Value::Int)
                .or_else(|_| raw.parse::<f64>().map(Value::Float))
                .map(Some)
                .map_err(|_| FilterError::store(format!("invalid number '{raw}'"))),
            SqlValue::SingleQuotedString(s) => Ok(Some(Value::Text(s.clone()))),
            SqlValue::Boolean(b) => Ok(Some(Value::Bool(*b))),
            SqlValue::Null => Ok(None),
            SqlValue::Placeholder(raw) => raw
                .strip_prefix('$')
                .and_then(|n| n.parse::<usize>().ok())
                .and_then(|n| self.values.get(n.checked_sub(1)?))
                .map(|v| Some(v.clone()))
                .ok_or_else(|| FilterError::store(format!("placeholder {raw} has no bound value"))),
            other => Err(FilterError::store(format!("unsupported literal {other}"))),
        }
    }

    fn ordered(&self, left: &Option<Value>, right: &Expr) -> FilterResult<Option<Ordering>> {
        match (left, self.scalar(right)?) {
            (Some(l), Some(r)) => compare(l, &r).map(Some),
            _ => Ok(None),
        }
    }
}

fn and(l: Option<bool>, r: Option<bool>) -> Option<bool> {
    match (l, r) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    }
}

fn or(l: Option<bool>, r: Option<bool>) -> Option<bool> {
    match (l, r) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
    }
}

fn compare(left: &Value, right: &Value) -> FilterResult<Ordering> {
    left.compare(right).ok_or_else(|| {
        if left.is_nan() || right.is_nan() {
            FilterError::store("NaN has no ordering and cannot be compared")
        } else {
            FilterError::store(format!(
                "cannot compare {} value with {} value",
                left.kind(),
                right.kind()
            ))
        }
    })
}
