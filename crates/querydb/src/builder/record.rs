//! Row payloads for INSERT / REPLACE / UPDATE / upsert statements.

use super::{Param, QueryBuilder};
use tokio_postgres::types::ToSql;

/// An ordered set of `(column, value)` pairs.
///
/// Column order is insertion order. For multi-row statements the first record fixes the
/// column list and every later record is bound in that order.
///
/// # Example
/// ```ignore
/// let row = Record::new().set("name", "alice").set("age", 30_i32);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Record {
    fields: Vec<(String, Param)>,
}

impl Record {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Set a column value. Setting a column twice keeps its first position and the last value.
    pub fn set<T: ToSql + Send + Sync + 'static>(self, column: &str, value: T) -> Self {
        self.set_param(column, Param::new(value))
    }

    /// Set a column to NULL.
    pub fn set_null(self, column: &str) -> Self {
        self.set_param(column, Param::null())
    }

    /// Set a column to a pre-wrapped value.
    pub fn set_param(mut self, column: &str, value: Param) -> Self {
        match self.fields.iter_mut().find(|(c, _)| c == column) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((column.to_string(), value)),
        }
        self
    }

    /// Column names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(c, _)| c.as_str())
    }

    /// Values in column order.
    pub fn values(&self) -> impl Iterator<Item = &Param> {
        self.fields.iter().map(|(_, v)| v)
    }

    pub fn get(&self, column: &str) -> Option<&Param> {
        self.fields.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Param)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Param)>>(iter: I) -> Self {
        iter.into_iter().fold(Record::new(), |record, (column, value)| {
            let column: String = column.into();
            record.set_param(&column, value)
        })
    }
}

/// The mutation payload attached to a builder.
#[derive(Clone, Debug, Default)]
pub(crate) enum Payload {
    #[default]
    Empty,
    /// INSERT / REPLACE rows
    Rows(Vec<Record>),
    /// UPDATE SET assignments
    Assignments(Record),
    /// INSERT values plus the SET list used on conflict
    Upsert { insert: Record, update: Record },
}

impl Payload {
    pub(crate) fn describe(&self) -> &'static str {
        match self {
            Payload::Empty => "no payload",
            Payload::Rows(_) => "insert rows",
            Payload::Assignments(_) => "update assignments",
            Payload::Upsert { .. } => "upsert values",
        }
    }
}

/// Bind every row in the first row's column order; missing cells bind NULL.
fn row_major(rows: &[Record]) -> Result<Vec<Param>, String> {
    let Some(first) = rows.first() else {
        return Err("at least one record is required".to_string());
    };
    if first.is_empty() {
        return Err("the first record has no columns".to_string());
    }

    let mut params = Vec::with_capacity(first.len() * rows.len());
    for (i, row) in rows.iter().enumerate() {
        if let Some(extra) = row.columns().find(|c| !first.contains(c)) {
            return Err(format!(
                "record {} has column '{}' that the first record lacks",
                i + 1,
                extra
            ));
        }
        for column in first.columns() {
            params.push(row.get(column).cloned().unwrap_or_else(Param::null));
        }
    }
    Ok(params)
}

impl QueryBuilder {
    fn attach_payload(mut self, payload: Payload, params: Result<Vec<Param>, String>) -> Self {
        if !matches!(self.payload, Payload::Empty) {
            let message = format!("{} already attached", self.payload.describe());
            self.fail(message);
            return self;
        }
        match params {
            Ok(params) => {
                // Payload clauses render before WHERE, so their values go in front of
                // anything the predicates already bound.
                self.args.prepend(params);
                self.payload = payload;
            }
            Err(message) => self.fail(message),
        }
        self
    }

    /// Attach rows for an INSERT or REPLACE statement.
    pub fn with_rows(self, rows: impl IntoIterator<Item = Record>) -> Self {
        let rows: Vec<Record> = rows.into_iter().collect();
        let params = row_major(&rows);
        self.attach_payload(Payload::Rows(rows), params)
    }

    /// Attach the SET assignments of an UPDATE statement.
    pub fn with_update(self, assignments: Record) -> Self {
        let params = if assignments.is_empty() {
            Err("update requires at least one column".to_string())
        } else {
            Ok(assignments.values().cloned().collect())
        };
        self.attach_payload(Payload::Assignments(assignments), params)
    }

    /// Attach the insert values and the conflict assignments of an upsert statement.
    pub fn with_upsert(self, insert: Record, update: Record) -> Self {
        let params = if insert.is_empty() || update.is_empty() {
            Err("upsert requires insert and update columns".to_string())
        } else {
            Ok(insert.values().chain(update.values()).cloned().collect())
        };
        self.attach_payload(Payload::Upsert { insert, update }, params)
    }
}
