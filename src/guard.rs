//! Request guards.
//!
//! A guard either hands the next step a typed value or ends the request with
//! an [`AppError`]. Handlers list guards as extractor arguments and axum runs
//! them left to right, stopping at the first rejection.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{FromRef, FromRequest, FromRequestParts, Path, Request},
    http::{header::CONTENT_TYPE, request::Parts, HeaderMap, StatusCode},
};
use anyhow::anyhow;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::debug;

use crate::{
    appresult::{AppError, AppResult, OrRespond},
    config::Config,
    db::{hubs, Hub, NewHub},
};

pub const INVALID_ID: &str = "Invalid id; hub not found";

pub const NAME_REQUIRED: &str = "the name is required";
pub const NAME_NOT_STRING: &str = "it needs to be a string!";
pub const NAME_UNTRIMMED: &str = "only whitespace does not count";
pub const NAME_TOO_SHORT: &str = "name has to be 3 chars long";
pub const NAME_TOO_LONG: &str = "name should be 10 chars tops";

/// Resolves a `:id` path segment to a stored hub.
pub async fn validate_id(db_pool: &SqlitePool, id: &str) -> AppResult<Hub> {
    // a non-numeric id can't name a hub
    let Ok(id) = id.parse::<i64>() else {
        return Err(AppError::NotFound(INVALID_ID));
    };

    hubs::find_by_id(db_pool, id)
        .await
        .or_respond("Error processing request")?
        .ok_or(AppError::NotFound(INVALID_ID))
}

/// Passes a JSON object with at least one key, or a non-empty array.
pub fn required_body(body: Option<Value>) -> AppResult<Value> {
    let filled = match &body {
        Some(Value::Object(map)) => !map.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        _ => false,
    };

    match body {
        Some(body) if filled => Ok(body),
        _ => Err(AppError::MissingBody),
    }
}

/// Hub schema, strict: nothing is coerced, the first broken rule wins and
/// every field except `name` is dropped.
pub fn validate_hub(body: &Value) -> Result<NewHub, &'static str> {
    let name = match body.get("name") {
        None | Some(Value::Null) => return Err(NAME_REQUIRED),
        Some(Value::String(name)) => name,
        Some(_) => return Err(NAME_NOT_STRING),
    };

    if name.trim() != name {
        return Err(NAME_UNTRIMMED);
    }
    if name.is_empty() {
        return Err(NAME_REQUIRED);
    }

    let len = name.chars().count();
    if len < 3 {
        return Err(NAME_TOO_SHORT);
    }
    if len > 10 {
        return Err(NAME_TOO_LONG);
    }

    Ok(NewHub { name: name.clone() })
}

/// Non-JSON or empty bodies count as no body at all. Broken JSON is a 400.
pub fn parse_json_body(headers: &HeaderMap, bytes: &[u8]) -> AppResult<Option<Value>> {
    if !is_json(headers) || bytes.is_empty() {
        return Ok(None);
    }

    serde_json::from_slice(bytes)
        .map(Some)
        .map_err(|err| AppError::Unhandled { status: StatusCode::BAD_REQUEST, source: err.into() })
}

fn is_json(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    essence.eq_ignore_ascii_case("application/json") || essence.ends_with("+json")
}

pub struct ValidHub(pub Hub);

impl<S> FromRequestParts<S> for ValidHub
where
    SqlitePool: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> AppResult<Self> {
        let Path(id) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::NotFound(INVALID_ID))?;

        let hub = validate_id(&SqlitePool::from_ref(state), &id).await;
        if hub.is_err() {
            debug!(id = %id, "hub lookup rejected");
        }
        hub.map(ValidHub)
    }
}

pub struct RequiredBody(pub Value);

impl RequiredBody {
    /// The body as a store payload. Only an object names columns.
    pub fn payload<T: DeserializeOwned>(self) -> anyhow::Result<T> {
        match self.0 {
            body @ Value::Object(_) => Ok(serde_json::from_value(body)?),
            other => Err(anyhow!("expected an object of columns, got {other}")),
        }
    }
}

impl<S> FromRequest<S> for RequiredBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> AppResult<Self> {
        let headers = req.headers().clone();
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Unhandled {
                status: rejection.status(),
                source: anyhow!(rejection.body_text()),
            })?;

        required_body(parse_json_body(&headers, &bytes)?).map(RequiredBody)
    }
}

/// [`RequiredBody`] followed by [`validate_hub`].
pub struct ValidatedHub(pub NewHub);

impl<S> FromRequest<S> for ValidatedHub
where
    Arc<Config>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> AppResult<Self> {
        let RequiredBody(body) = RequiredBody::from_request(req, state).await?;

        validate_hub(&body)
            .map(ValidatedHub)
            .map_err(|message| AppError::Rejected {
                message: message.to_owned(),
                status: Arc::<Config>::from_ref(state).schema_failure_status(),
            })
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderValue, StatusCode};
    use serde_json::json;

    use super::*;
    use crate::db::{memory_pool, HubChanges};

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json; charset=utf-8"));
        headers
    }

    #[test]
    fn hub_schema_rules_in_order() {
        let cases = [
            (json!({}), NAME_REQUIRED),
            (json!({ "name": null }), NAME_REQUIRED),
            (json!({ "name": "" }), NAME_REQUIRED),
            (json!({ "name": 12345 }), NAME_NOT_STRING),
            (json!({ "name": "   " }), NAME_UNTRIMMED),
            (json!({ "name": " Tech" }), NAME_UNTRIMMED),
            (json!({ "name": "ab" }), NAME_TOO_SHORT),
            (json!({ "name": "abcdefghijk" }), NAME_TOO_LONG),
        ];

        for (body, expected) in cases {
            assert_eq!(validate_hub(&body), Err(expected), "{body}");
        }
    }

    #[test]
    fn hub_schema_strips_unknown_fields() {
        let hub = validate_hub(&json!({ "name": "Tech", "id": 7, "extra": true })).unwrap();
        assert_eq!(hub, NewHub { name: "Tech".to_owned() });

        // length counts characters, not bytes
        assert!(validate_hub(&json!({ "name": "éééééééééé" })).is_ok());
    }

    #[test]
    fn required_body_wants_something_with_keys() {
        assert!(matches!(required_body(None), Err(AppError::MissingBody)));
        assert!(matches!(required_body(Some(json!({}))), Err(AppError::MissingBody)));
        assert!(matches!(required_body(Some(json!([]))), Err(AppError::MissingBody)));
        assert!(matches!(required_body(Some(json!("text"))), Err(AppError::MissingBody)));
        assert!(matches!(required_body(Some(Value::Null)), Err(AppError::MissingBody)));
        assert_eq!(required_body(Some(json!({ "a": 1 }))).unwrap(), json!({ "a": 1 }));
        assert_eq!(required_body(Some(json!([1, 2]))).unwrap(), json!([1, 2]));
    }

    #[test]
    fn payload_needs_an_object() {
        let changes: HubChanges = RequiredBody(json!({ "name": "Tech" })).payload().unwrap();
        assert_eq!(changes.name.as_deref(), Some("Tech"));

        assert!(RequiredBody(json!(["Tech"])).payload::<HubChanges>().is_err());
    }

    #[test]
    fn json_body_parsing() {
        assert_eq!(parse_json_body(&HeaderMap::new(), br#"{"a":1}"#).unwrap(), None);
        assert_eq!(parse_json_body(&json_headers(), b"").unwrap(), None);
        assert_eq!(parse_json_body(&json_headers(), br#"{"a":1}"#).unwrap(), Some(json!({ "a": 1 })));

        let err = parse_json_body(&json_headers(), b"{nope").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn validate_id_outcomes() {
        let db_pool = memory_pool().await;
        let hub = hubs::add(&db_pool, &NewHub { name: "Tech".to_owned() }).await.unwrap();

        assert_eq!(validate_id(&db_pool, &hub.id.to_string()).await.unwrap(), hub);
        assert!(matches!(validate_id(&db_pool, "999").await, Err(AppError::NotFound(INVALID_ID))));
        assert!(matches!(validate_id(&db_pool, "abc").await, Err(AppError::NotFound(INVALID_ID))));

        sqlx::query("DROP TABLE messages").execute(&db_pool).await.unwrap();
        sqlx::query("DROP TABLE hubs").execute(&db_pool).await.unwrap();
        let err = validate_id(&db_pool, &hub.id.to_string()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Error processing request");
    }
}
