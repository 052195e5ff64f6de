use sqlx::SqlitePool;

use super::{Message, NewMessage};

pub async fn add(db_pool: &SqlitePool, hub_id: i64, NewMessage { sender, text }: &NewMessage) -> sqlx::Result<Message> {
    sqlx::query_as(
        "INSERT INTO messages (hub_id,sender,text) VALUES (?,?,?) RETURNING id,hub_id,sender,text,created_at,updated_at",
    )
        .bind(hub_id)
        .bind(sender)
        .bind(text)
        .fetch_one(db_pool)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{hubs, memory_pool, NewHub};

    #[tokio::test]
    async fn rejects_unknown_hub() {
        let db_pool = memory_pool().await;
        let msg = NewMessage { sender: "ada".to_owned(), text: "hi".to_owned() };

        assert!(add(&db_pool, 999, &msg).await.is_err());

        let hub = hubs::add(&db_pool, &NewHub { name: "Tech".to_owned() }).await.unwrap();
        let added = add(&db_pool, hub.id, &msg).await.unwrap();
        assert_eq!(added.hub_id, hub.id);
        assert_eq!(added.text, "hi");
    }
}
