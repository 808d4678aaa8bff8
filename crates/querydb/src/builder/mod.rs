//! The fluent statement builder.
//!
//! A [`QueryBuilder`] records everything a statement needs: target tables, projection,
//! predicates, joins, unions, ordering, grouping, paging, mutation payloads and the
//! argument sequence. Every step consumes the builder and returns it, so calls chain and no
//! two call sites share mutable state.
//!
//! Values are bound in the same call that records the clause they belong to, so the
//! [`Args`] sequence always follows the left-to-right placeholder order of the compiled
//! SQL. See [`crate::grammar`] for the compiler.
//!
//! # Example
//!
//! ```ignore
//! use querydb::table;
//!
//! let active = table("users")
//!     .select(&["id", "name"])
//!     .where_("status", "active")
//!     .or_in("role", vec!["admin", "owner"])
//!     .order_by("created_at", "desc")
//!     .limit(20);
//!
//! let rows = active.get_rows(&client).await?;
//! ```

mod args;
mod predicate;
mod record;
mod relation;

pub use args::{Args, Param, SqlNull};
pub use predicate::{Combinator, Op, Operator, Predicate};
pub use record::Record;
pub use relation::{Join, JoinKind, UnionKind, UnionMember};

pub(crate) use record::Payload;

use crate::error::DbResult;
use crate::grammar::{CompiledStatement, Grammar, Placeholder, StatementKind};
use tokio_postgres::types::ToSql;

/// Sort direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    /// Normalize a direction string: `"desc"` in any case is descending, anything else is
    /// ascending.
    pub fn parse(direction: &str) -> Self {
        if direction.trim().eq_ignore_ascii_case("desc") {
            Direction::Desc
        } else {
            Direction::Asc
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// One ORDER BY entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: Direction,
}

/// Fluent builder for a single SQL statement.
#[derive(Clone, Debug, Default)]
pub struct QueryBuilder {
    /// Target tables (FROM list / mutation target)
    pub(crate) tables: Vec<String>,
    /// Projected columns (empty renders `*`)
    pub(crate) columns: Vec<String>,
    pub(crate) distinct: bool,
    /// WHERE chain
    pub(crate) predicates: Vec<Predicate>,
    pub(crate) joins: Vec<Join>,
    pub(crate) unions: Vec<UnionMember>,
    pub(crate) groups: Vec<String>,
    pub(crate) orders: Vec<OrderBy>,
    /// 0 means unset
    pub(crate) limit: u64,
    pub(crate) offset: u64,
    /// ORDER BY / LIMIT / OFFSET applied to the combined result of a union
    pub(crate) union_orders: Vec<OrderBy>,
    pub(crate) union_limit: u64,
    pub(crate) union_offset: u64,
    /// ON CONFLICT target for REPLACE and upsert
    pub(crate) conflict_target: Vec<String>,
    pub(crate) returning: Vec<String>,
    pub(crate) payload: Payload,
    pub(crate) args: Args,
    /// Trailing entries of `args` that belong to union members
    pub(crate) union_args: usize,
    pub(crate) placeholder: Placeholder,
    /// First invalid call; reported when the statement is compiled
    pub(crate) build_error: Option<String>,
}

/// Start a builder for `table`.
///
/// # Example
/// ```ignore
/// let qb = querydb::table("users").where_("id", 1_i64);
/// ```
pub fn table(name: &str) -> QueryBuilder {
    QueryBuilder::new(name)
}

impl QueryBuilder {
    /// Create a builder targeting a single table.
    pub fn new(table: &str) -> Self {
        Self {
            tables: vec![table.to_string()],
            ..Self::default()
        }
    }

    /// Replace the target table list (rendered comma separated in FROM).
    pub fn tables(mut self, tables: &[&str]) -> Self {
        self.tables = tables.iter().map(|t| t.to_string()).collect();
        self
    }

    // ==================== Projection ====================

    /// Set the projected columns. An empty list selects `*`.
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Select distinct rows.
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    // ==================== Ordering & Grouping ====================

    /// Set GROUP BY expressions.
    pub fn group_by(mut self, groups: &[&str]) -> Self {
        self.groups = groups.iter().map(|g| g.to_string()).collect();
        self
    }

    /// Add ORDER BY `column` with a direction string (`"desc"` or ascending).
    pub fn order_by(mut self, column: &str, direction: &str) -> Self {
        self.orders.push(OrderBy {
            column: column.to_string(),
            direction: Direction::parse(direction),
        });
        self
    }

    /// Add ORDER BY column ASC.
    pub fn order_by_asc(self, column: &str) -> Self {
        self.order_by(column, "asc")
    }

    /// Add ORDER BY column DESC.
    pub fn order_by_desc(self, column: &str) -> Self {
        self.order_by(column, "desc")
    }

    // ==================== Pagination ====================

    /// Set LIMIT (0 = unlimited).
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Set OFFSET (0 = none).
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Alias for `offset`.
    pub fn skip(self, offset: u64) -> Self {
        self.offset(offset)
    }

    // ==================== Union shape ====================

    /// Add ORDER BY for the combined union result.
    pub fn union_order_by(mut self, column: &str, direction: &str) -> Self {
        self.union_orders.push(OrderBy {
            column: column.to_string(),
            direction: Direction::parse(direction),
        });
        self
    }

    /// Set LIMIT for the combined union result.
    pub fn union_limit(mut self, limit: u64) -> Self {
        self.union_limit = limit;
        self
    }

    /// Set OFFSET for the combined union result.
    pub fn union_offset(mut self, offset: u64) -> Self {
        self.union_offset = offset;
        self
    }

    // ==================== Mutation options ====================

    /// Set the ON CONFLICT target used by REPLACE and upsert statements.
    pub fn on_conflict(mut self, columns: &[&str]) -> Self {
        self.conflict_target = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Set RETURNING columns for mutation statements.
    pub fn returning(mut self, columns: &[&str]) -> Self {
        self.returning = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Choose the placeholder style used when this builder is compiled.
    pub fn placeholder(mut self, style: Placeholder) -> Self {
        self.placeholder = style;
        self
    }

    // ==================== Inspection ====================

    /// The argument sequence as currently recorded.
    pub fn args(&self) -> &Args {
        &self.args
    }

    /// The recorded WHERE chain.
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Compile the builder into SQL text and its bound arguments.
    ///
    /// Compilation does not change the builder; compiling twice yields the same output.
    pub fn compile(&self, kind: StatementKind) -> DbResult<CompiledStatement> {
        Grammar::new(self).compile(kind)
    }

    /// Compile and return only the SQL text (for debugging).
    pub fn to_sql(&self, kind: StatementKind) -> DbResult<String> {
        self.compile(kind).map(|stmt| stmt.sql)
    }

    /// Bind a predicate value. Predicate placeholders render before any union member's, so
    /// the value goes in front of the union segment.
    pub(crate) fn bind<T: ToSql + Send + Sync + 'static>(&mut self, value: T) {
        let at = self.args.len() - self.union_args;
        self.args.insert(at, Param::new(value));
    }

    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        if self.build_error.is_none() {
            self.build_error = Some(message.into());
        }
    }
}
