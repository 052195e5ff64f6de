use axum::{debug_handler, extract::State, http::StatusCode, Json};
use sqlx::SqlitePool;
use tracing::info;

use crate::{appresult::OrRespond, db::{hubs, Hub}, guard::ValidatedHub, AppResult, AppState};

#[debug_handler(state = AppState)]
pub(crate) async fn new_hub(
    State(db_pool): State<SqlitePool>,
    ValidatedHub(new_hub): ValidatedHub,
) -> AppResult<(StatusCode, Json<Hub>)> {
    let hub = hubs::add(&db_pool, &new_hub).await.or_respond("Error adding the hub")?;

    info!(id = hub.id, name = %hub.name, "hub added");
    Ok((StatusCode::CREATED, Json(hub)))
}
