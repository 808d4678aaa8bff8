//! WHERE predicates: a flat chain of conditions joined left to right by AND/OR.

use super::QueryBuilder;
use crate::error::DbError;
use std::fmt;
use std::str::FromStr;
use tokio_postgres::types::ToSql;

/// How a predicate joins the predicate before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    pub fn as_sql(self) -> &'static str {
        match self {
            Combinator::And => "AND",
            Combinator::Or => "OR",
        }
    }
}

/// Single-value comparison operator.
///
/// # Example
/// ```ignore
/// use querydb::Op;
///
/// let op: Op = ">=".parse()?;
/// assert_eq!(op, Op::Gte);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Equal: column = value
    Eq,
    /// Not equal: column != value
    Ne,
    /// Greater than: column > value
    Gt,
    /// Greater than or equal: column >= value
    Gte,
    /// Less than: column < value
    Lt,
    /// Less than or equal: column <= value
    Lte,
    /// LIKE pattern match
    Like,
    /// NOT LIKE pattern match
    NotLike,
    /// Case-insensitive LIKE (PostgreSQL ILIKE)
    ILike,
    /// NOT ILIKE pattern match
    NotILike,
}

impl Op {
    pub fn as_sql(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::Like => "LIKE",
            Op::NotLike => "NOT LIKE",
            Op::ILike => "ILIKE",
            Op::NotILike => "NOT ILIKE",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Op {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        let op = match normalized.to_ascii_uppercase().as_str() {
            "=" | "==" => Op::Eq,
            "!=" | "<>" => Op::Ne,
            ">" => Op::Gt,
            ">=" => Op::Gte,
            "<" => Op::Lt,
            "<=" => Op::Lte,
            "LIKE" => Op::Like,
            "NOT LIKE" => Op::NotLike,
            "ILIKE" => Op::ILike,
            "NOT ILIKE" => Op::NotILike,
            _ => {
                return Err(DbError::validation(format!(
                    "unsupported comparison operator '{}'",
                    s
                )));
            }
        };
        Ok(op)
    }
}

/// What a predicate tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// The column text is a complete boolean expression; nothing is bound.
    Raw,
    Compare(Op),
    Between,
    NotBetween,
    In,
    NotIn,
    IsNull,
    IsNotNull,
}

/// One WHERE condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub(crate) column: String,
    pub(crate) operator: Operator,
    /// Number of arguments this predicate bound
    pub(crate) arity: usize,
    pub(crate) combinator: Combinator,
}

impl Predicate {
    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn combinator(&self) -> Combinator {
        self.combinator
    }
}

impl QueryBuilder {
    fn push_predicate(
        &mut self,
        column: &str,
        operator: Operator,
        arity: usize,
        combinator: Combinator,
    ) {
        self.predicates.push(Predicate {
            column: column.to_string(),
            operator,
            arity,
            combinator,
        });
    }

    fn raw_predicate(mut self, expr: &str, combinator: Combinator) -> Self {
        self.push_predicate(expr, Operator::Raw, 0, combinator);
        self
    }

    fn compare<T>(mut self, column: &str, op: Op, value: T, combinator: Combinator) -> Self
    where
        T: ToSql + Send + Sync + 'static,
    {
        self.push_predicate(column, Operator::Compare(op), 1, combinator);
        self.bind(value);
        self
    }

    fn compare_str<T>(mut self, column: &str, op: &str, value: T, combinator: Combinator) -> Self
    where
        T: ToSql + Send + Sync + 'static,
    {
        match op.parse::<Op>() {
            Ok(op) => self.compare(column, op, value, combinator),
            Err(_) => {
                self.fail(format!(
                    "unsupported comparison operator '{}' for column '{}'",
                    op, column
                ));
                self
            }
        }
    }

    fn range<T>(mut self, column: &str, from: T, to: T, negated: bool, combinator: Combinator) -> Self
    where
        T: ToSql + Send + Sync + 'static,
    {
        let operator = if negated { Operator::NotBetween } else { Operator::Between };
        self.push_predicate(column, operator, 2, combinator);
        self.bind(from);
        self.bind(to);
        self
    }

    fn membership<T>(
        mut self,
        column: &str,
        values: impl IntoIterator<Item = T>,
        negated: bool,
        combinator: Combinator,
    ) -> Self
    where
        T: ToSql + Send + Sync + 'static,
    {
        let before = self.args.len();
        for value in values {
            self.bind(value);
        }
        let operator = if negated { Operator::NotIn } else { Operator::In };
        let arity = self.args.len() - before;
        self.push_predicate(column, operator, arity, combinator);
        self
    }

    fn null_check(mut self, column: &str, negated: bool, combinator: Combinator) -> Self {
        let operator = if negated { Operator::IsNotNull } else { Operator::IsNull };
        self.push_predicate(column, operator, 0, combinator);
        self
    }

    // ==================== Generic WHERE ====================

    /// Add a raw boolean expression; nothing is bound.
    pub fn where_raw(self, expr: &str) -> Self {
        self.raw_predicate(expr, Combinator::And)
    }

    /// OR a raw boolean expression; nothing is bound.
    pub fn or_where_raw(self, expr: &str) -> Self {
        self.raw_predicate(expr, Combinator::Or)
    }

    /// Add WHERE: column = value
    pub fn where_<T: ToSql + Send + Sync + 'static>(self, column: &str, value: T) -> Self {
        self.compare(column, Op::Eq, value, Combinator::And)
    }

    /// OR: column = value
    pub fn or_where<T: ToSql + Send + Sync + 'static>(self, column: &str, value: T) -> Self {
        self.compare(column, Op::Eq, value, Combinator::Or)
    }

    /// Add WHERE: column <op> value, with the operator given as text (`">="`, `"like"`, ...).
    ///
    /// An unknown operator binds nothing and makes compilation fail with a validation error.
    pub fn where_op<T: ToSql + Send + Sync + 'static>(self, column: &str, op: &str, value: T) -> Self {
        self.compare_str(column, op, value, Combinator::And)
    }

    /// OR: column <op> value, with the operator given as text.
    pub fn or_where_op<T: ToSql + Send + Sync + 'static>(self, column: &str, op: &str, value: T) -> Self {
        self.compare_str(column, op, value, Combinator::Or)
    }

    /// Add WHERE: column <op> value, with a typed operator.
    pub fn where_cmp<T: ToSql + Send + Sync + 'static>(self, column: &str, op: Op, value: T) -> Self {
        self.compare(column, op, value, Combinator::And)
    }

    /// OR: column <op> value, with a typed operator.
    pub fn or_where_cmp<T: ToSql + Send + Sync + 'static>(self, column: &str, op: Op, value: T) -> Self {
        self.compare(column, op, value, Combinator::Or)
    }

    /// Add WHERE: column BETWEEN from AND to (the two-value form of `where_`).
    pub fn where_between<T: ToSql + Send + Sync + 'static>(self, column: &str, from: T, to: T) -> Self {
        self.range(column, from, to, false, Combinator::And)
    }

    /// OR: column BETWEEN from AND to
    pub fn or_where_between<T: ToSql + Send + Sync + 'static>(self, column: &str, from: T, to: T) -> Self {
        self.range(column, from, to, false, Combinator::Or)
    }

    // ==================== Comparisons ====================

    /// Add WHERE: column = value
    pub fn equal<T: ToSql + Send + Sync + 'static>(self, column: &str, value: T) -> Self {
        self.compare(column, Op::Eq, value, Combinator::And)
    }

    /// OR: column = value
    pub fn or_equal<T: ToSql + Send + Sync + 'static>(self, column: &str, value: T) -> Self {
        self.compare(column, Op::Eq, value, Combinator::Or)
    }

    /// Add WHERE: column != value
    pub fn not_equal<T: ToSql + Send + Sync + 'static>(self, column: &str, value: T) -> Self {
        self.compare(column, Op::Ne, value, Combinator::And)
    }

    /// OR: column != value
    pub fn or_not_equal<T: ToSql + Send + Sync + 'static>(self, column: &str, value: T) -> Self {
        self.compare(column, Op::Ne, value, Combinator::Or)
    }

    /// Add WHERE: column > value
    pub fn gt<T: ToSql + Send + Sync + 'static>(self, column: &str, value: T) -> Self {
        self.compare(column, Op::Gt, value, Combinator::And)
    }

    /// OR: column > value
    pub fn or_gt<T: ToSql + Send + Sync + 'static>(self, column: &str, value: T) -> Self {
        self.compare(column, Op::Gt, value, Combinator::Or)
    }

    /// Add WHERE: column >= value
    pub fn gte<T: ToSql + Send + Sync + 'static>(self, column: &str, value: T) -> Self {
        self.compare(column, Op::Gte, value, Combinator::And)
    }

    /// OR: column >= value
    pub fn or_gte<T: ToSql + Send + Sync + 'static>(self, column: &str, value: T) -> Self {
        self.compare(column, Op::Gte, value, Combinator::Or)
    }

    /// Add WHERE: column < value
    pub fn lt<T: ToSql + Send + Sync + 'static>(self, column: &str, value: T) -> Self {
        self.compare(column, Op::Lt, value, Combinator::And)
    }

    /// OR: column < value
    pub fn or_lt<T: ToSql + Send + Sync + 'static>(self, column: &str, value: T) -> Self {
        self.compare(column, Op::Lt, value, Combinator::Or)
    }

    /// Add WHERE: column <= value
    pub fn lte<T: ToSql + Send + Sync + 'static>(self, column: &str, value: T) -> Self {
        self.compare(column, Op::Lte, value, Combinator::And)
    }

    /// OR: column <= value
    pub fn or_lte<T: ToSql + Send + Sync + 'static>(self, column: &str, value: T) -> Self {
        self.compare(column, Op::Lte, value, Combinator::Or)
    }

    // ==================== Pattern matching ====================

    /// Add WHERE: column LIKE pattern
    pub fn like<T: ToSql + Send + Sync + 'static>(self, column: &str, pattern: T) -> Self {
        self.compare(column, Op::Like, pattern, Combinator::And)
    }

    /// OR: column LIKE pattern
    pub fn or_like<T: ToSql + Send + Sync + 'static>(self, column: &str, pattern: T) -> Self {
        self.compare(column, Op::Like, pattern, Combinator::Or)
    }

    /// Add WHERE: column NOT LIKE pattern
    pub fn not_like<T: ToSql + Send + Sync + 'static>(self, column: &str, pattern: T) -> Self {
        self.compare(column, Op::NotLike, pattern, Combinator::And)
    }

    /// OR: column NOT LIKE pattern
    pub fn or_not_like<T: ToSql + Send + Sync + 'static>(self, column: &str, pattern: T) -> Self {
        self.compare(column, Op::NotLike, pattern, Combinator::Or)
    }

    /// Add WHERE: column ILIKE pattern (case-insensitive)
    pub fn ilike<T: ToSql + Send + Sync + 'static>(self, column: &str, pattern: T) -> Self {
        self.compare(column, Op::ILike, pattern, Combinator::And)
    }

    /// OR: column ILIKE pattern
    pub fn or_ilike<T: ToSql + Send + Sync + 'static>(self, column: &str, pattern: T) -> Self {
        self.compare(column, Op::ILike, pattern, Combinator::Or)
    }

    /// Add WHERE: column NOT ILIKE pattern
    pub fn not_ilike<T: ToSql + Send + Sync + 'static>(self, column: &str, pattern: T) -> Self {
        self.compare(column, Op::NotILike, pattern, Combinator::And)
    }

    /// OR: column NOT ILIKE pattern
    pub fn or_not_ilike<T: ToSql + Send + Sync + 'static>(self, column: &str, pattern: T) -> Self {
        self.compare(column, Op::NotILike, pattern, Combinator::Or)
    }

    // ==================== Ranges ====================

    /// Add WHERE: column BETWEEN from AND to
    pub fn between<T: ToSql + Send + Sync + 'static>(self, column: &str, from: T, to: T) -> Self {
        self.range(column, from, to, false, Combinator::And)
    }

    /// OR: column BETWEEN from AND to
    pub fn or_between<T: ToSql + Send + Sync + 'static>(self, column: &str, from: T, to: T) -> Self {
        self.range(column, from, to, false, Combinator::Or)
    }

    /// Add WHERE: column NOT BETWEEN from AND to
    pub fn not_between<T: ToSql + Send + Sync + 'static>(self, column: &str, from: T, to: T) -> Self {
        self.range(column, from, to, true, Combinator::And)
    }

    /// OR: column NOT BETWEEN from AND to
    pub fn or_not_between<T: ToSql + Send + Sync + 'static>(self, column: &str, from: T, to: T) -> Self {
        self.range(column, from, to, true, Combinator::Or)
    }

    // ==================== Membership ====================

    /// Add WHERE: column IN (values...)
    ///
    /// An empty list renders `1=0`.
    pub fn in_list<T: ToSql + Send + Sync + 'static>(self, column: &str, values: impl IntoIterator<Item = T>) -> Self {
        self.membership(column, values, false, Combinator::And)
    }

    /// OR: column IN (values...)
    pub fn or_in<T: ToSql + Send + Sync + 'static>(self, column: &str, values: impl IntoIterator<Item = T>) -> Self {
        self.membership(column, values, false, Combinator::Or)
    }

    /// Add WHERE: column NOT IN (values...)
    ///
    /// An empty list renders `1=1`.
    pub fn not_in<T: ToSql + Send + Sync + 'static>(self, column: &str, values: impl IntoIterator<Item = T>) -> Self {
        self.membership(column, values, true, Combinator::And)
    }

    /// OR: column NOT IN (values...)
    pub fn or_not_in<T: ToSql + Send + Sync + 'static>(self, column: &str, values: impl IntoIterator<Item = T>) -> Self {
        self.membership(column, values, true, Combinator::Or)
    }

    // ==================== NULL checks ====================

    /// Add WHERE: column IS NULL
    pub fn is_null(self, column: &str) -> Self {
        self.null_check(column, false, Combinator::And)
    }

    /// OR: column IS NULL
    pub fn or_is_null(self, column: &str) -> Self {
        self.null_check(column, false, Combinator::Or)
    }

    /// Add WHERE: column IS NOT NULL
    pub fn is_not_null(self, column: &str) -> Self {
        self.null_check(column, true, Combinator::And)
    }

    /// OR: column IS NOT NULL
    pub fn or_is_not_null(self, column: &str) -> Self {
        self.null_check(column, true, Combinator::Or)
    }
}
