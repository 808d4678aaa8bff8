//! Ordered argument storage shared by the builder and the compiler.

use bytes::BytesMut;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use tokio_postgres::types::{IsNull, ToSql, Type};

/// A clone-friendly bound value.
///
/// Cloning a builder (or attaching it as a union member) shares the values instead of
/// copying them.
#[derive(Clone)]
pub struct Param(pub(crate) Arc<dyn ToSql + Send + Sync>);

impl Param {
    /// Create a new parameter from any ToSql value.
    pub fn new<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Param(Arc::new(value))
    }

    /// A NULL that binds to a placeholder of any type.
    pub fn null() -> Self {
        Param::new(SqlNull)
    }

    /// Get a reference to the inner value as a ToSql trait object.
    pub fn as_ref(&self) -> &(dyn ToSql + Sync) {
        &*self.0 as &(dyn ToSql + Sync)
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// Untyped SQL NULL.
///
/// `Option::<T>::None` only binds to columns whose type `T` accepts; this value accepts every
/// Postgres type, which is what a record with a missing column needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SqlNull;

impl ToSql for SqlNull {
    fn to_sql(
        &self,
        _ty: &Type,
        _out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        Ok(IsNull::Yes)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    tokio_postgres::types::to_sql_checked!();
}

/// The argument sequence of a statement.
///
/// Values are kept in the exact order their placeholders appear in the compiled SQL.
/// Predicates append (ahead of any union member values), union members append at attach
/// time, and payloads whose clause renders before the WHERE clause prepend.
#[derive(Clone, Debug, Default)]
pub struct Args {
    params: Vec<Param>,
}

impl Args {
    /// Create a new empty argument list.
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Append a value and return its 1-based position.
    pub fn push<T: ToSql + Send + Sync + 'static>(&mut self, value: T) -> usize {
        self.push_param(Param::new(value))
    }

    /// Append a pre-wrapped Param and return its 1-based position.
    pub fn push_param(&mut self, param: Param) -> usize {
        self.params.push(param);
        self.params.len()
    }

    /// Insert a value at `index`, shifting later values back.
    pub fn insert(&mut self, index: usize, param: Param) {
        self.params.insert(index, param);
    }

    /// Append every value of `other`, in order.
    pub fn extend(&mut self, other: &Args) {
        self.params.extend(other.params.iter().cloned());
    }

    /// Insert `params` before the existing values, keeping their relative order.
    pub fn prepend(&mut self, params: impl IntoIterator<Item = Param>) {
        let mut front: Vec<Param> = params.into_iter().collect();
        front.append(&mut self.params);
        self.params = front;
    }

    /// Get the current argument count.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterate over the values in bind order.
    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.params.iter()
    }

    /// Get all values as references for tokio-postgres.
    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }

    /// Copy the values out in bind order.
    pub fn to_vec(&self) -> Vec<Param> {
        self.params.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debug(args: &Args) -> Vec<String> {
        args.iter().map(|p| format!("{p:?}")).collect()
    }

    #[test]
    fn push_returns_position() {
        let mut args = Args::new();
        assert_eq!(args.push(1_i32), 1);
        assert_eq!(args.push("a"), 2);
        assert_eq!(debug(&args), ["1", "\"a\""]);
    }

    #[test]
    fn prepend_keeps_relative_order() {
        let mut args = Args::new();
        args.push(5_i32);
        args.prepend([Param::new("x"), Param::new("y")]);
        assert_eq!(debug(&args), ["\"x\"", "\"y\"", "5"]);
    }

    #[test]
    fn extend_appends_in_order() {
        let mut a = Args::new();
        a.push(1_i32);
        let mut b = Args::new();
        b.push(2_i32);
        b.push(3_i32);
        a.extend(&b);
        assert_eq!(debug(&a), ["1", "2", "3"]);
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn null_param_accepts_any_type() {
        assert!(<SqlNull as ToSql>::accepts(&Type::INT8));
        assert!(<SqlNull as ToSql>::accepts(&Type::TEXT));
        assert_eq!(format!("{:?}", Param::null()), "SqlNull");
    }
}
