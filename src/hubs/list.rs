use std::collections::HashMap;

use axum::{debug_handler, extract::{Query, State}, Json};
use sqlx::SqlitePool;

use crate::{appresult::OrRespond, db::{hubs::{self, HubFilter}, Hub}, AppResult, AppState};

const RETRIEVE_FAILED: &str = "Error retrieving the hubs";

#[debug_handler(state = AppState)]
pub(crate) async fn list_hubs(
    State(db_pool): State<SqlitePool>,
    Query(query): Query<HashMap<String, String>>,
) -> AppResult<Json<Vec<Hub>>> {
    let filter = HubFilter::from_query(query).or_respond(RETRIEVE_FAILED)?;

    Ok(Json(
        hubs::find(&db_pool, &filter).await.or_respond(RETRIEVE_FAILED)?
    ))
}
