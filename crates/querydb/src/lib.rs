//! # querydb
//!
//! A fluent, fully parameterized SQL statement builder for PostgreSQL.
//!
//! ## Features
//!
//! - **No hand-written SQL**: predicates, joins, unions, ordering, grouping and paging are
//!   recorded through chained calls
//! - **Aligned arguments**: every compiled statement carries its values in placeholder order,
//!   including values from nested unions
//! - **Mutations**: multi-row INSERT, REPLACE and upsert (via `ON CONFLICT`), UPDATE, DELETE
//! - **Transaction-friendly**: pass a transaction anywhere a `GenericClient` is expected
//! - **Logged**: every statement is reported through `tracing` on the `querydb.sql` target
//!
//! ## Example
//!
//! ```ignore
//! use querydb::{Record, table};
//!
//! // SELECT
//! let rows = table("users")
//!     .where_("status", "active")
//!     .or_in("role", vec!["admin", "owner"])
//!     .order_by("created_at", "desc")
//!     .limit(10)
//!     .get_rows(&client)
//!     .await?;
//!
//! // UNION
//! let ids: Vec<(i64,)> = table("users")
//!     .select(&["id"])
//!     .gt("score", 100_i32)
//!     .union_all([table("archived_users").select(&["id"]).gt("score", 100_i32)])
//!     .union_order_by("id", "asc")
//!     .fetch_all(&client)
//!     .await?;
//!
//! // INSERT
//! table("users")
//!     .insert(&client, [Record::new().set("name", "alice").set("age", 30_i32)])
//!     .await?;
//!
//! // UPDATE
//! table("users")
//!     .where_("id", user_id)
//!     .update(&client, Record::new().set("status", "inactive"))
//!     .await?;
//! ```

pub mod builder;
pub mod client;
pub mod config;
pub mod error;
mod exec;
pub mod grammar;
pub mod row;

pub use builder::{
    Args, Combinator, Direction, Join, JoinKind, Op, Operator, OrderBy, Param, Predicate,
    QueryBuilder, Record, SqlNull, UnionKind, UnionMember, table,
};
pub use client::GenericClient;
pub use config::{DbConfig, Recycling};
pub use error::{DbError, DbResult};
pub use grammar::{CompiledStatement, Grammar, Placeholder, StatementKind};
pub use row::{FromRow, RowExt};

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_from_config, create_pool_with_config};
