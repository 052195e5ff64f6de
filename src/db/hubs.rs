use std::collections::HashMap;

use anyhow::anyhow;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::{Hub, HubChanges, Message, NewHub};

const HUB_COLUMNS: &str = "id,name,created_at,updated_at";

/// Equality filters for listing hubs, taken from the query string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HubFilter {
    pub id: Option<i64>,
    pub name: Option<String>,
}

impl HubFilter {
    /// Unknown keys are errors: they name columns that don't exist.
    pub fn from_query(query: HashMap<String, String>) -> anyhow::Result<HubFilter> {
        let mut filter = HubFilter::default();
        for (key, value) in query {
            match key.as_str() {
                "id" => filter.id = Some(value.parse().map_err(|_| anyhow!("hub id {value:?} is not an integer"))?),
                "name" => filter.name = Some(value),
                _ => return Err(anyhow!("no such hub column: {key}")),
            }
        }
        Ok(filter)
    }
}

pub async fn find(db_pool: &SqlitePool, filter: &HubFilter) -> sqlx::Result<Vec<Hub>> {
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!("SELECT {HUB_COLUMNS} FROM hubs WHERE 1=1"));
    if let Some(id) = filter.id {
        query.push(" AND id=").push_bind(id);
    }
    if let Some(name) = &filter.name {
        query.push(" AND name=").push_bind(name.as_str());
    }
    query.push(" ORDER BY id");

    query.build_query_as::<Hub>()
        .fetch_all(db_pool)
        .await
}

pub async fn find_by_id(db_pool: &SqlitePool, id: i64) -> sqlx::Result<Option<Hub>> {
    sqlx::query_as(&format!("SELECT {HUB_COLUMNS} FROM hubs WHERE id=?"))
        .bind(id)
        .fetch_optional(db_pool)
        .await
}

pub async fn add(db_pool: &SqlitePool, NewHub { name }: &NewHub) -> sqlx::Result<Hub> {
    sqlx::query_as(&format!("INSERT INTO hubs (name) VALUES (?) RETURNING {HUB_COLUMNS}"))
        .bind(name)
        .fetch_one(db_pool)
        .await
}

/// `None` when no hub has this id.
pub async fn update(db_pool: &SqlitePool, id: i64, HubChanges { name }: &HubChanges) -> sqlx::Result<Option<Hub>> {
    sqlx::query_as(&format!(
        "UPDATE hubs SET name=COALESCE(?,name), updated_at=CURRENT_TIMESTAMP WHERE id=? RETURNING {HUB_COLUMNS}"
    ))
        .bind(name)
        .bind(id)
        .fetch_optional(db_pool)
        .await
}

/// Returns how many hubs were deleted.
pub async fn remove(db_pool: &SqlitePool, id: i64) -> sqlx::Result<u64> {
    Ok(
        sqlx::query("DELETE FROM hubs WHERE id=?")
            .bind(id)
            .execute(db_pool)
            .await?
            .rows_affected()
    )
}

pub async fn find_hub_messages(db_pool: &SqlitePool, hub_id: i64) -> sqlx::Result<Vec<Message>> {
    sqlx::query_as("SELECT id,hub_id,sender,text,created_at,updated_at FROM messages WHERE hub_id=? ORDER BY id")
        .bind(hub_id)
        .fetch_all(db_pool)
        .await
}
