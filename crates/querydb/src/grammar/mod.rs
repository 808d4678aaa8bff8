//! The statement compiler.
//!
//! [`Grammar`] turns a [`QueryBuilder`] snapshot into SQL text plus the argument list the
//! text expects. It never mutates the builder, so compiling the same builder twice yields the
//! same statement.
//!
//! Clause order:
//!
//! ```text
//! verb + target -> SET (UPDATE) -> FROM/JOIN (SELECT/DELETE) -> WHERE -> GROUP BY
//!   -> UNION blocks -> ORDER BY -> LIMIT/OFFSET (SELECT only) -> RETURNING (mutations)
//! ```
//!
//! Placeholders are emitted in the same left-to-right order the builder bound its values, and
//! the compiler refuses to return a statement whose placeholder count differs from the
//! argument count.

mod writer;

pub use writer::Placeholder;

use crate::builder::{
    Combinator, OrderBy, Param, Payload, Predicate, Operator, QueryBuilder, Record,
};
use crate::error::{DbError, DbResult};
use tokio_postgres::types::ToSql;
use writer::SqlWriter;

/// The statement a builder is compiled into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    /// INSERT that overwrites conflicting rows
    Replace,
    Update,
    Delete,
    /// INSERT with explicit assignments on conflict
    Upsert,
}

impl StatementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StatementKind::Select => "select",
            StatementKind::Insert => "insert",
            StatementKind::Replace => "replace",
            StatementKind::Update => "update",
            StatementKind::Delete => "delete",
            StatementKind::Upsert => "upsert",
        }
    }

    fn is_insert_like(self) -> bool {
        matches!(
            self,
            StatementKind::Insert | StatementKind::Replace | StatementKind::Upsert
        )
    }
}

/// SQL text plus the values for its placeholders, in placeholder order.
#[derive(Debug, Clone)]
pub struct CompiledStatement {
    pub sql: String,
    pub args: Vec<Param>,
}

impl CompiledStatement {
    /// Borrow the arguments in the form tokio-postgres expects.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.args.iter().map(|p| p.as_ref()).collect()
    }
}

/// Compiles one builder.
pub struct Grammar<'a> {
    qb: &'a QueryBuilder,
}

impl<'a> Grammar<'a> {
    pub fn new(qb: &'a QueryBuilder) -> Self {
        Self { qb }
    }

    /// Compile the builder as `kind`.
    pub fn compile(&self, kind: StatementKind) -> DbResult<CompiledStatement> {
        self.check_build_errors()?;
        check_shape(self.qb, kind)?;

        let sql = match kind {
            StatementKind::Select => select_statement(self.qb),
            StatementKind::Insert | StatementKind::Replace => self.insert_statement(kind)?,
            StatementKind::Upsert => self.upsert_statement()?,
            StatementKind::Update => self.update_statement()?,
            StatementKind::Delete => self.delete_statement(),
        };
        self.finish(sql)
    }

    /// Compile a `COUNT(*)` over the rows the SELECT would return.
    ///
    /// Simple selects swap the projection for `COUNT(*)`. Grouped, distinct, paged or
    /// unioned selects are counted through a subquery.
    pub fn compile_count(&self) -> DbResult<CompiledStatement> {
        self.check_build_errors()?;
        check_shape(self.qb, StatementKind::Select)?;

        let qb = self.qb;
        let needs_subquery = !qb.groups.is_empty()
            || qb.distinct
            || !qb.unions.is_empty()
            || qb.limit > 0
            || qb.offset > 0;

        let mut w = SqlWriter::new();
        if needs_subquery {
            w.push("SELECT COUNT(*) FROM (");
            w.push_writer(select_statement(qb));
            w.push(") AS _count");
        } else {
            w.push_writer(select_core(qb, Some("COUNT(*)")));
        }
        self.finish(w)
    }

    /// Compile `SELECT EXISTS(<select>)`.
    pub fn compile_exists(&self) -> DbResult<CompiledStatement> {
        self.check_build_errors()?;
        check_shape(self.qb, StatementKind::Select)?;

        let mut w = SqlWriter::new();
        w.push("SELECT EXISTS(");
        w.push_writer(select_statement(self.qb));
        w.push(")");
        self.finish(w)
    }

    fn finish(&self, sql: SqlWriter) -> DbResult<CompiledStatement> {
        let placeholders = sql.placeholder_count();
        let args = self.qb.args.len();
        if placeholders != args {
            return Err(DbError::ArgumentMismatch { placeholders, args });
        }

        Ok(CompiledStatement {
            sql: sql.render(self.qb.placeholder),
            args: self.qb.args.to_vec(),
        })
    }

    fn check_build_errors(&self) -> DbResult<()> {
        match first_build_error(self.qb) {
            Some(message) => Err(DbError::validation(message)),
            None => Ok(()),
        }
    }

    // ==================== Mutations ====================

    fn insert_statement(&self, kind: StatementKind) -> DbResult<SqlWriter> {
        let qb = self.qb;
        let Payload::Rows(rows) = &qb.payload else {
            return Err(DbError::validation("insert requires rows"));
        };
        let Some(first) = rows.first() else {
            return Err(DbError::validation("insert requires at least one record"));
        };
        let columns: Vec<&str> = first.columns().collect();

        let mut w = SqlWriter::new();
        write_insert_head(&mut w, &qb.tables[0], &columns);
        for (i, _) in rows.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            w.push("(").push_placeholder_list(columns.len()).push(")");
        }

        if kind == StatementKind::Replace {
            w.push(" ON CONFLICT (");
            w.push(&qb.conflict_target.join(", "));
            w.push(")");

            let overwrite: Vec<String> = columns
                .iter()
                .filter(|c| !qb.conflict_target.iter().any(|t| t == *c))
                .map(|c| format!("{c} = EXCLUDED.{c}"))
                .collect();
            if overwrite.is_empty() {
                w.push(" DO NOTHING");
            } else {
                w.push(" DO UPDATE SET ");
                w.push(&overwrite.join(", "));
            }
        }

        write_returning(&mut w, qb);
        Ok(w)
    }

    fn upsert_statement(&self) -> DbResult<SqlWriter> {
        let qb = self.qb;
        let Payload::Upsert { insert, update } = &qb.payload else {
            return Err(DbError::validation("upsert requires insert and update values"));
        };
        let columns: Vec<&str> = insert.columns().collect();

        let mut w = SqlWriter::new();
        write_insert_head(&mut w, &qb.tables[0], &columns);
        w.push("(").push_placeholder_list(columns.len()).push(")");
        w.push(" ON CONFLICT (");
        w.push(&qb.conflict_target.join(", "));
        w.push(") DO UPDATE SET ");
        write_assignments(&mut w, update);

        write_returning(&mut w, qb);
        Ok(w)
    }

    fn update_statement(&self) -> DbResult<SqlWriter> {
        let qb = self.qb;
        let Payload::Assignments(assignments) = &qb.payload else {
            return Err(DbError::validation("update requires assignments"));
        };

        let mut w = SqlWriter::new();
        w.push("UPDATE ").push(&qb.tables[0]).push(" SET ");
        write_assignments(&mut w, assignments);
        write_where(&mut w, &qb.predicates);

        write_returning(&mut w, qb);
        Ok(w)
    }

    fn delete_statement(&self) -> SqlWriter {
        let qb = self.qb;

        let mut w = SqlWriter::new();
        w.push("DELETE FROM ").push(&qb.tables[0]);
        write_joins(&mut w, qb);
        write_where(&mut w, &qb.predicates);

        write_returning(&mut w, qb);
        w
    }
}

/// The first deferred error in the builder or any union member, depth first.
fn first_build_error(qb: &QueryBuilder) -> Option<&str> {
    qb.build_error.as_deref().or_else(|| {
        qb.unions
            .iter()
            .find_map(|member| first_build_error(member.query()))
    })
}

/// Validate the builder's shape for `kind`, then every union member as a SELECT.
fn check_shape(qb: &QueryBuilder, kind: StatementKind) -> DbResult<()> {
    let verb = kind.as_str();

    if kind == StatementKind::Select {
        if qb.tables.is_empty() {
            return Err(DbError::validation("select requires at least one table"));
        }
    } else if qb.tables.len() != 1 {
        return Err(DbError::validation(format!(
            "{} requires exactly one table, got {}",
            verb,
            qb.tables.len()
        )));
    }

    if kind != StatementKind::Select && !qb.unions.is_empty() {
        return Err(DbError::validation(format!("{} does not accept unions", verb)));
    }
    if kind.is_insert_like() && !qb.predicates.is_empty() {
        return Err(DbError::validation(format!(
            "{} does not accept WHERE predicates",
            verb
        )));
    }
    if kind == StatementKind::Update && !qb.joins.is_empty() {
        return Err(DbError::validation("update does not accept joins"));
    }

    let payload_ok = match kind {
        StatementKind::Select | StatementKind::Delete => matches!(qb.payload, Payload::Empty),
        StatementKind::Insert | StatementKind::Replace => matches!(qb.payload, Payload::Rows(_)),
        StatementKind::Update => matches!(qb.payload, Payload::Assignments(_)),
        StatementKind::Upsert => matches!(qb.payload, Payload::Upsert { .. }),
    };
    if !payload_ok {
        return Err(DbError::validation(format!(
            "{} cannot be compiled with {}",
            verb,
            qb.payload.describe()
        )));
    }

    if matches!(kind, StatementKind::Replace | StatementKind::Upsert)
        && qb.conflict_target.is_empty()
    {
        return Err(DbError::validation(format!(
            "{} requires an on_conflict target",
            verb
        )));
    }
    if kind == StatementKind::Delete && qb.predicates.is_empty() {
        return Err(DbError::validation(
            "delete requires at least one WHERE predicate; use where_raw(\"TRUE\") to delete every row",
        ));
    }

    // Members render as SELECT blocks inside this statement.
    for member in &qb.unions {
        check_shape(member.query(), StatementKind::Select)?;
    }
    Ok(())
}

// ==================== SELECT ====================

/// A full SELECT: the leading block, its union members and the outer ordering/paging.
fn select_statement(qb: &QueryBuilder) -> SqlWriter {
    let mut w = SqlWriter::new();

    if qb.unions.is_empty() {
        w.push_writer(select_block(qb));
        return w;
    }

    let lead = select_block(qb);
    if has_own_shape(qb) {
        w.push_parenthesized(lead);
    } else {
        w.push_writer(lead);
    }

    for member in &qb.unions {
        let query = member.query();
        w.push(" ").push(member.kind().as_sql()).push(" ");

        let block = select_statement(query);
        if has_own_shape(query) || !query.unions.is_empty() {
            w.push_parenthesized(block);
        } else {
            w.push_writer(block);
        }
    }

    write_order_by(&mut w, &qb.union_orders);
    write_paging(&mut w, qb.union_limit, qb.union_offset);
    w
}

/// One SELECT block with its own ORDER BY / LIMIT / OFFSET.
fn select_block(qb: &QueryBuilder) -> SqlWriter {
    let mut w = select_core(qb, None);
    write_order_by(&mut w, &qb.orders);
    write_paging(&mut w, qb.limit, qb.offset);
    w
}

/// SELECT ... FROM ... JOIN ... WHERE ... GROUP BY ...
fn select_core(qb: &QueryBuilder, projection: Option<&str>) -> SqlWriter {
    let mut w = SqlWriter::new();
    w.push("SELECT ");
    match projection {
        Some(expr) => {
            w.push(expr);
        }
        None => {
            if qb.distinct {
                w.push("DISTINCT ");
            }
            if qb.columns.is_empty() {
                w.push("*");
            } else {
                w.push(&qb.columns.join(", "));
            }
        }
    }
    w.push(" FROM ").push(&qb.tables.join(", "));

    write_joins(&mut w, qb);
    write_where(&mut w, &qb.predicates);

    if !qb.groups.is_empty() {
        w.push(" GROUP BY ").push(&qb.groups.join(", "));
    }
    w
}

fn has_own_shape(qb: &QueryBuilder) -> bool {
    !qb.orders.is_empty() || qb.limit > 0 || qb.offset > 0
}

// ==================== Clauses ====================

fn write_joins(w: &mut SqlWriter, qb: &QueryBuilder) {
    for join in &qb.joins {
        w.push(" ")
            .push(join.kind.as_sql())
            .push(" ")
            .push(&join.table)
            .push(" ON ")
            .push(&join.on);
    }
}

fn write_where(w: &mut SqlWriter, predicates: &[Predicate]) {
    if predicates.is_empty() {
        return;
    }

    w.push(" WHERE ");
    for (i, predicate) in predicates.iter().enumerate() {
        if i > 0 {
            let keyword = match predicate.combinator() {
                Combinator::And => " AND ",
                Combinator::Or => " OR ",
            };
            w.push(keyword);
        }
        write_predicate(w, predicate);
    }
}

fn write_predicate(w: &mut SqlWriter, predicate: &Predicate) {
    let column = predicate.column();
    match predicate.operator() {
        Operator::Raw => {
            w.push(column);
        }
        Operator::Compare(op) => {
            w.push(column).push(" ").push(op.as_sql()).push(" ");
            w.push_placeholder();
        }
        Operator::Between | Operator::NotBetween => {
            let keyword = if predicate.operator() == Operator::Between {
                " BETWEEN "
            } else {
                " NOT BETWEEN "
            };
            w.push(column).push(keyword);
            w.push_placeholder().push(" AND ").push_placeholder();
        }
        Operator::In if predicate.arity() == 0 => {
            w.push("1=0");
        }
        Operator::NotIn if predicate.arity() == 0 => {
            w.push("1=1");
        }
        Operator::In | Operator::NotIn => {
            let keyword = if predicate.operator() == Operator::In {
                " IN ("
            } else {
                " NOT IN ("
            };
            w.push(column).push(keyword);
            w.push_placeholder_list(predicate.arity()).push(")");
        }
        Operator::IsNull => {
            w.push(column).push(" IS NULL");
        }
        Operator::IsNotNull => {
            w.push(column).push(" IS NOT NULL");
        }
    }
}

fn write_order_by(w: &mut SqlWriter, orders: &[OrderBy]) {
    if orders.is_empty() {
        return;
    }
    let items: Vec<String> = orders
        .iter()
        .map(|o| format!("{} {}", o.column, o.direction.as_sql()))
        .collect();
    w.push(" ORDER BY ").push(&items.join(", "));
}

fn write_paging(w: &mut SqlWriter, limit: u64, offset: u64) {
    if limit > 0 {
        w.push(&format!(" LIMIT {}", limit));
    }
    if offset > 0 {
        w.push(&format!(" OFFSET {}", offset));
    }
}

fn write_insert_head(w: &mut SqlWriter, table: &str, columns: &[&str]) {
    w.push("INSERT INTO ")
        .push(table)
        .push(" (")
        .push(&columns.join(", "))
        .push(") VALUES ");
}

fn write_assignments(w: &mut SqlWriter, record: &Record) {
    for (i, column) in record.columns().enumerate() {
        if i > 0 {
            w.push(", ");
        }
        w.push(column).push(" = ");
        w.push_placeholder();
    }
}

fn write_returning(w: &mut SqlWriter, qb: &QueryBuilder) {
    if !qb.returning.is_empty() {
        w.push(" RETURNING ").push(&qb.returning.join(", "));
    }
}
