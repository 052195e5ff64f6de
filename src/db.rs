pub mod hubs;
pub mod messages;

use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqlitePoolOptions, FromRow, SqlitePool};

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Hub {
    pub id: i64,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Message {
    pub id: i64,
    pub hub_id: i64,
    pub sender: String,
    pub text: String,
    pub created_at: String,
    pub updated_at: String,

    // hub_id -> hubs.id, cascades on delete
}

/// A hub that passed the schema guard.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewHub {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HubChanges {
    pub name: Option<String>,
}

/// Message payload. `hub_id` is never read from here; it comes from the path.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMessage {
    pub sender: String,
    pub text: String,
}

pub async fn connect(database_url: &str, max_connections: u32) -> sqlx::Result<SqlitePool> {
    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Creates the two tables when they don't exist yet.
pub async fn create_tables(db_pool: &SqlitePool) -> sqlx::Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS hubs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(db_pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            hub_id INTEGER NOT NULL REFERENCES hubs(id) ON DELETE CASCADE ON UPDATE CASCADE,
            sender TEXT NOT NULL,
            text TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(db_pool)
    .await?;

    Ok(())
}

#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    // one connection, kept forever: every sqlite::memory: connection is its own database
    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    create_tables(&db_pool).await.unwrap();
    db_pool
}
