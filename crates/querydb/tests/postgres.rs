//! End-to-end checks against a real PostgreSQL server.
//!
//! Skipped unless `DATABASE_URL` is set (a `.env` file is honoured).

use querydb::{DbError, DbResult, Record, RowExt, table};
use tokio_postgres::{Client, NoTls};

async fn connect(test: &str) -> DbResult<Option<Client>> {
    dotenvy::dotenv().ok();
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(v) => v,
        Err(_) => {
            eprintln!("DATABASE_URL is not set; skipping {test}");
            return Ok(None);
        }
    };

    let (client, connection) = tokio_postgres::connect(&database_url, NoTls)
        .await
        .map_err(DbError::from_db_error)?;
    tokio::spawn(async move {
        let _ = connection.await;
    });

    client
        .batch_execute(
            "CREATE TEMP TABLE people (
                id BIGSERIAL PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                age INT4
            );
            CREATE TEMP TABLE former_people (
                email TEXT NOT NULL,
                name TEXT NOT NULL,
                age INT4
            );",
        )
        .await
        .map_err(DbError::from_db_error)?;

    Ok(Some(client))
}

fn person(email: &str, name: &str, age: i32) -> Record {
    Record::new()
        .set("email", email.to_string())
        .set("name", name.to_string())
        .set("age", age)
}

#[tokio::test]
async fn insert_select_update_delete_roundtrip() -> DbResult<()> {
    let Some(client) = connect("insert_select_update_delete_roundtrip").await? else {
        return Ok(());
    };

    let inserted = table("people")
        .insert(
            &client,
            [
                person("a@x.io", "Ann", 31),
                person("b@x.io", "Bob", 17),
                Record::new()
                    .set("email", "c@x.io".to_string())
                    .set("name", "Cy".to_string()),
            ],
        )
        .await?;
    assert_eq!(inserted, 3);

    let adults = table("people")
        .select(&["name"])
        .gte("age", 18_i32)
        .order_by("name", "asc")
        .get_rows(&client)
        .await?;
    let names: Vec<String> = adults
        .iter()
        .map(|row| row.try_get_column("name"))
        .collect::<DbResult<_>>()?;
    assert_eq!(names, ["Ann"]);

    assert_eq!(table("people").is_null("age").count(&client).await?, 1);
    assert!(table("people").where_("email", "b@x.io").exists(&client).await?);

    let updated = table("people")
        .where_("email", "b@x.io")
        .update(&client, Record::new().set("age", 18_i32))
        .await?;
    assert_eq!(updated, 1);
    assert_eq!(table("people").between("age", 18_i32, 40_i32).count(&client).await?, 2);

    let deleted = table("people").in_list("email", vec!["a@x.io", "c@x.io"]).delete(&client).await?;
    assert_eq!(deleted, 2);

    let err = table("people").where_("email", "a@x.io").get_row(&client).await.unwrap_err();
    assert!(err.is_not_found());
    Ok(())
}

#[tokio::test]
async fn conflicts_replace_and_upsert() -> DbResult<()> {
    let Some(client) = connect("conflicts_replace_and_upsert").await? else {
        return Ok(());
    };

    let id = table("people")
        .insert_get_id(&client, person("u@x.io", "Una", 20), "id")
        .await?;
    assert!(id > 0);

    let err = table("people")
        .insert(&client, [person("u@x.io", "Dup", 1)])
        .await
        .unwrap_err();
    assert!(err.is_unique_violation());
    assert!(err.sql().is_some_and(|sql| sql.starts_with("INSERT INTO people")));

    table("people")
        .on_conflict(&["email"])
        .replace(&client, [person("u@x.io", "Una Prime", 21)])
        .await?;

    table("people")
        .on_conflict(&["email"])
        .insert_update(
            &client,
            person("u@x.io", "ignored", 0),
            Record::new().set("age", 99_i32),
        )
        .await?;

    let (name, age): (String, i32) = table("people")
        .select(&["name", "age"])
        .where_("id", id)
        .fetch_one(&client)
        .await?;
    assert_eq!(name, "Una Prime");
    assert_eq!(age, 99);
    Ok(())
}

#[tokio::test]
async fn unions_bind_arguments_in_order() -> DbResult<()> {
    let Some(client) = connect("unions_bind_arguments_in_order").await? else {
        return Ok(());
    };

    table("people")
        .insert(&client, [person("p@x.io", "Pia", 40), person("q@x.io", "Quinn", 12)])
        .await?;
    table("former_people")
        .insert(&client, [person("r@x.io", "Rae", 50), person("s@x.io", "Sol", 8)])
        .await?;

    let names: Vec<(String,)> = table("people")
        .select(&["name"])
        .gt("age", 30_i32)
        .union_all([table("former_people").select(&["name"]).lt("age", 10_i32)])
        .union_order_by("name", "desc")
        .fetch_all(&client)
        .await?;
    let names: Vec<String> = names.into_iter().map(|(n,)| n).collect();
    assert_eq!(names, ["Sol", "Pia"]);

    let total = table("people")
        .select(&["email"])
        .union([table("former_people").select(&["email"])])
        .count(&client)
        .await?;
    assert_eq!(total, 4);
    Ok(())
}
