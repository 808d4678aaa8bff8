//! Compile-only tests for core API patterns.
//!
//! These tests verify that the terminal operations accept every client type.
//! They do NOT execute against a database.

#![allow(dead_code)]

use querydb::{DbResult, GenericClient, Record, table};

async fn _generic_reads(conn: &impl GenericClient) -> DbResult<()> {
    let _rows = table("users").where_("id", 1_i64).get_rows(conn).await?;
    let _row = table("users").get_row(conn).await?;
    let _pairs: Vec<(i64, String)> = table("users").select(&["id", "name"]).fetch_all(conn).await?;
    let _count: i64 = table("users").count(conn).await?;
    let _exists: bool = table("users").exists(conn).await?;
    Ok(())
}

async fn _generic_writes(conn: &impl GenericClient) -> DbResult<()> {
    table("users")
        .insert(conn, [Record::new().set("name", "a")])
        .await?;
    let _id: i64 = table("users")
        .insert_get_id(conn, Record::new().set("name", "a"), "id")
        .await?;
    table("users")
        .where_("id", 1_i64)
        .update(conn, Record::new().set("name", "b"))
        .await?;
    table("users").where_("id", 1_i64).delete(conn).await?;
    Ok(())
}

async fn _transaction_compiles(client: &mut tokio_postgres::Client) -> DbResult<()> {
    let tx = client
        .transaction()
        .await
        .map_err(querydb::DbError::from_db_error)?;
    _generic_reads(&tx).await?;
    _generic_writes(&tx).await?;
    tx.commit().await.map_err(querydb::DbError::from_db_error)?;
    Ok(())
}

#[cfg(feature = "pool")]
async fn _pool_client_compiles(pool: &deadpool_postgres::Pool) -> DbResult<()> {
    let client = pool.get().await?;
    _generic_reads(&client).await?;
    _generic_writes(&client).await?;
    Ok(())
}

#[test]
fn compile_only() {}
