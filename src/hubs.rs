mod hub;
mod list;
mod msg;
mod new;

use axum::{middleware::from_fn, routing::get, Router};

use crate::{middleware::hubs_router_logger, AppState};

pub(crate) const HUB_NOT_FOUND: &str = "The hub could not be found";

/// Mounted at `/api/hubs`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::list_hubs).post(new::new_hub))
        .route("/{id}", get(hub::hub).put(hub::update_hub).delete(hub::remove_hub))
        .route("/{id}/messages", get(msg::hub_messages).post(msg::new_message))
        .layer(from_fn(hubs_router_logger))
}
