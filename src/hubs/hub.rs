use axum::{debug_handler, extract::State, Json};
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::info;

use crate::{
    appresult::{message_body, AppError, OrRespond},
    db::{hubs, Hub, HubChanges},
    guard::{RequiredBody, ValidHub},
    AppResult, AppState,
};

use super::HUB_NOT_FOUND;

#[debug_handler(state = AppState)]
pub(crate) async fn hub(ValidHub(hub): ValidHub) -> Json<Hub> {
    Json(hub)
}

#[debug_handler(state = AppState)]
pub(crate) async fn update_hub(
    ValidHub(hub): ValidHub,
    State(db_pool): State<SqlitePool>,
    body: RequiredBody,
) -> AppResult<Json<Hub>> {
    const UPDATE_FAILED: &str = "Error updating the hub";

    let changes: HubChanges = body.payload().or_respond(UPDATE_FAILED)?;

    let Some(updated) = hubs::update(&db_pool, hub.id, &changes).await.or_respond(UPDATE_FAILED)? else {
        return Err(AppError::NotFound(HUB_NOT_FOUND));
    };

    Ok(Json(updated))
}

#[debug_handler(state = AppState)]
pub(crate) async fn remove_hub(
    ValidHub(hub): ValidHub,
    State(db_pool): State<SqlitePool>,
) -> AppResult<Json<Value>> {
    let count = hubs::remove(&db_pool, hub.id).await.or_respond("Error removing the hub")?;
    if count == 0 {
        return Err(AppError::NotFound(HUB_NOT_FOUND));
    }

    info!(id = hub.id, name = %hub.name, "hub nuked");
    Ok(message_body("The hub has been nuked"))
}
