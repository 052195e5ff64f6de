use std::sync::Arc;

use axum::{debug_handler, extract::State, http::StatusCode, Json};
use sqlx::SqlitePool;

use crate::{
    appresult::OrRespond,
    config::Config,
    db::{hubs, messages, Message, NewMessage},
    guard::{RequiredBody, ValidHub},
    AppResult, AppState,
};

// both routes answer with this one on failure
const MESSAGES_FAILED: &str = "Error getting the messages for the hub";

#[debug_handler(state = AppState)]
pub(crate) async fn hub_messages(
    ValidHub(hub): ValidHub,
    State(db_pool): State<SqlitePool>,
) -> AppResult<Json<Vec<Message>>> {
    Ok(Json(
        hubs::find_hub_messages(&db_pool, hub.id).await.or_respond(MESSAGES_FAILED)?
    ))
}

/// The hub comes from the path. A `hub_id` in the body is ignored.
#[debug_handler(state = AppState)]
pub(crate) async fn new_message(
    ValidHub(hub): ValidHub,
    State(db_pool): State<SqlitePool>,
    State(config): State<Arc<Config>>,
    body: RequiredBody,
) -> AppResult<(StatusCode, Json<Message>)> {
    let new_message: NewMessage = body.payload().or_respond(MESSAGES_FAILED)?;

    let message = messages::add(&db_pool, hub.id, &new_message).await.or_respond(MESSAGES_FAILED)?;

    Ok((config.message_created_status(), Json(message)))
}
