//! Terminal operations: compile a builder and run it through a [`GenericClient`].
//!
//! Every operation logs the statement on the `querydb.sql` target before it is sent and logs
//! failures with the SQL attached. Errors coming back from the client are wrapped in
//! [`DbError::Execution`] so callers can see the exact text that failed.

use crate::builder::{QueryBuilder, Record};
use crate::client::GenericClient;
use crate::error::{DbError, DbResult};
use crate::grammar::{CompiledStatement, Grammar, StatementKind};
use crate::row::{FromRow, RowExt};
use tokio_postgres::Row;

/// Longest SQL prefix written to the log.
const MAX_LOGGED_SQL: usize = 200;

fn truncate_sql(sql: &str) -> &str {
    if sql.len() <= MAX_LOGGED_SQL {
        return sql;
    }
    let mut end = MAX_LOGGED_SQL;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

fn log_statement(operation: &str, stmt: &CompiledStatement) {
    tracing::debug!(
        target: "querydb.sql",
        operation,
        param_count = stmt.args.len(),
        sql = %truncate_sql(&stmt.sql),
    );
}

fn log_failure(operation: &str, stmt: &CompiledStatement, err: DbError) -> DbError {
    tracing::error!(
        target: "querydb.sql",
        operation,
        sql = %truncate_sql(&stmt.sql),
        error = %err,
    );
    DbError::execution(stmt.sql.clone(), err)
}

async fn query_rows(
    conn: &impl GenericClient,
    operation: &str,
    stmt: CompiledStatement,
) -> DbResult<Vec<Row>> {
    log_statement(operation, &stmt);
    let params = stmt.params_ref();
    conn.query(&stmt.sql, &params)
        .await
        .map_err(|e| log_failure(operation, &stmt, e))
}

async fn query_one(
    conn: &impl GenericClient,
    operation: &str,
    stmt: CompiledStatement,
) -> DbResult<Row> {
    log_statement(operation, &stmt);
    let params = stmt.params_ref();
    conn.query_one(&stmt.sql, &params)
        .await
        .map_err(|e| log_failure(operation, &stmt, e))
}

async fn query_opt(
    conn: &impl GenericClient,
    operation: &str,
    stmt: CompiledStatement,
) -> DbResult<Option<Row>> {
    log_statement(operation, &stmt);
    let params = stmt.params_ref();
    conn.query_opt(&stmt.sql, &params)
        .await
        .map_err(|e| log_failure(operation, &stmt, e))
}

async fn execute(
    conn: &impl GenericClient,
    operation: &str,
    stmt: CompiledStatement,
) -> DbResult<u64> {
    log_statement(operation, &stmt);
    let params = stmt.params_ref();
    conn.execute(&stmt.sql, &params)
        .await
        .map_err(|e| log_failure(operation, &stmt, e))
}

impl QueryBuilder {
    /// The same SELECT capped at one row. With unions the cap applies to the combined result.
    fn first_row_only(&self) -> QueryBuilder {
        if self.unions.is_empty() {
            self.clone().limit(1)
        } else {
            self.clone().union_limit(1)
        }
    }

    // ==================== Reads ====================

    /// Run the SELECT and return every row.
    pub async fn get_rows(&self, conn: &impl GenericClient) -> DbResult<Vec<Row>> {
        let stmt = self.compile(StatementKind::Select)?;
        query_rows(conn, "get_rows", stmt).await
    }

    /// Run the SELECT capped at one row and return that row.
    ///
    /// Returns [`DbError::NotFound`] (wrapped with the SQL) when nothing matches.
    pub async fn get_row(&self, conn: &impl GenericClient) -> DbResult<Row> {
        let stmt = self.first_row_only().compile(StatementKind::Select)?;
        query_one(conn, "get_row", stmt).await
    }

    /// Run the SELECT and map every row to `T`.
    pub async fn fetch_all<T: FromRow>(&self, conn: &impl GenericClient) -> DbResult<Vec<T>> {
        let rows = self.get_rows(conn).await?;
        rows.iter().map(T::from_row).collect()
    }

    /// Run the SELECT capped at one row and map the row to `T`.
    pub async fn fetch_one<T: FromRow>(&self, conn: &impl GenericClient) -> DbResult<T> {
        let row = self.get_row(conn).await?;
        T::from_row(&row)
    }

    /// Run the SELECT capped at one row and map the row, if any, to `T`.
    pub async fn fetch_opt<T: FromRow>(&self, conn: &impl GenericClient) -> DbResult<Option<T>> {
        let stmt = self.first_row_only().compile(StatementKind::Select)?;
        let row = query_opt(conn, "fetch_opt", stmt).await?;
        row.as_ref().map(T::from_row).transpose()
    }

    /// Count the rows the SELECT would return.
    pub async fn count(&self, conn: &impl GenericClient) -> DbResult<i64> {
        let stmt = Grammar::new(self).compile_count()?;
        let row = query_one(conn, "count", stmt).await?;
        row.try_get_index(0)
    }

    /// Check whether the SELECT matches at least one row.
    pub async fn exists(&self, conn: &impl GenericClient) -> DbResult<bool> {
        let stmt = Grammar::new(self).compile_exists()?;
        let row = query_one(conn, "exists", stmt).await?;
        row.try_get_index(0)
    }

    // ==================== Writes ====================

    /// Insert one or more records in a single statement. Returns the affected row count.
    pub async fn insert(
        self,
        conn: &impl GenericClient,
        rows: impl IntoIterator<Item = Record>,
    ) -> DbResult<u64> {
        let stmt = self.with_rows(rows).compile(StatementKind::Insert)?;
        execute(conn, "insert", stmt).await
    }

    /// Insert one record and return the generated value of `id_column`.
    pub async fn insert_get_id(
        self,
        conn: &impl GenericClient,
        record: Record,
        id_column: &str,
    ) -> DbResult<i64> {
        let stmt = self
            .returning(&[id_column])
            .with_rows([record])
            .compile(StatementKind::Insert)?;
        let row = query_one(conn, "insert_get_id", stmt).await?;
        row.try_get_column(id_column)
    }

    /// Insert records, overwriting rows that collide on the `on_conflict` target.
    pub async fn replace(
        self,
        conn: &impl GenericClient,
        rows: impl IntoIterator<Item = Record>,
    ) -> DbResult<u64> {
        let stmt = self.with_rows(rows).compile(StatementKind::Replace)?;
        execute(conn, "replace", stmt).await
    }

    /// Update the matching rows with `assignments`.
    pub async fn update(self, conn: &impl GenericClient, assignments: Record) -> DbResult<u64> {
        let stmt = self.with_update(assignments).compile(StatementKind::Update)?;
        execute(conn, "update", stmt).await
    }

    /// Insert `insert`, or apply `update` to the row that collides on the `on_conflict` target.
    pub async fn insert_update(
        self,
        conn: &impl GenericClient,
        insert: Record,
        update: Record,
    ) -> DbResult<u64> {
        let stmt = self
            .with_upsert(insert, update)
            .compile(StatementKind::Upsert)?;
        execute(conn, "insert_update", stmt).await
    }

    /// Delete the matching rows.
    pub async fn delete(&self, conn: &impl GenericClient) -> DbResult<u64> {
        let stmt = self.compile(StatementKind::Delete)?;
        execute(conn, "delete", stmt).await
    }
}
