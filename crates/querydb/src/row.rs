//! Row mapping traits and utilities

use crate::error::{DbError, DbResult};
use tokio_postgres::Row;
use tokio_postgres::types::FromSql;

/// Trait for types that can be constructed from a database row
///
/// # Example
///
/// ```ignore
/// struct User {
///     id: i64,
///     name: String,
/// }
///
/// impl FromRow for User {
///     fn from_row(row: &Row) -> DbResult<Self> {
///         Ok(Self {
///             id: row.try_get_column("id")?,
///             name: row.try_get_column("name")?,
///         })
///     }
/// }
/// ```
pub trait FromRow: Sized {
    /// Convert a database row into Self
    fn from_row(row: &Row) -> DbResult<Self>;
}

macro_rules! impl_from_row_tuple {
    ($($idx:tt => $ty:ident),+) => {
        impl<$($ty),+> FromRow for ($($ty,)+)
        where
            $($ty: for<'a> FromSql<'a>),+
        {
            fn from_row(row: &Row) -> DbResult<Self> {
                Ok(($(row.try_get_index::<$ty>($idx)?,)+))
            }
        }
    };
}

impl_from_row_tuple!(0 => A);
impl_from_row_tuple!(0 => A, 1 => B);
impl_from_row_tuple!(0 => A, 1 => B, 2 => C);
impl_from_row_tuple!(0 => A, 1 => B, 2 => C, 3 => D);

/// Extension trait for Row to provide typed access
pub trait RowExt {
    /// Try to get a column value, returning DbError::Decode on failure
    fn try_get_column<T>(&self, column: &str) -> DbResult<T>
    where
        T: for<'a> FromSql<'a>;

    /// Try to get a value by position, returning DbError::Decode on failure
    fn try_get_index<T>(&self, index: usize) -> DbResult<T>
    where
        T: for<'a> FromSql<'a>;
}

impl RowExt for Row {
    fn try_get_column<T>(&self, column: &str) -> DbResult<T>
    where
        T: for<'a> FromSql<'a>,
    {
        self.try_get(column)
            .map_err(|e| DbError::decode(column, e.to_string()))
    }

    fn try_get_index<T>(&self, index: usize) -> DbResult<T>
    where
        T: for<'a> FromSql<'a>,
    {
        self.try_get(index)
            .map_err(|e| DbError::decode(index.to_string(), e.to_string()))
    }
}
