use std::{any::Any, sync::Arc, time::Instant};

use axum::{
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    appresult::{message_body, AppError},
    config::{Config, GatePolicy},
};

/// The name `add_name` attaches to every request.
#[derive(Debug, Clone)]
pub struct ServerName(pub String);

/// Helmet's default response headers.
const SECURITY_HEADERS: [(&str, &str); 12] = [
    (
        "content-security-policy",
        "default-src 'self';base-uri 'self';font-src 'self' https: data:;form-action 'self';\
         frame-ancestors 'self';img-src 'self' data:;object-src 'none';script-src 'self';\
         script-src-attr 'none';style-src 'self' https: 'unsafe-inline';upgrade-insecure-requests",
    ),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    ("origin-agent-cluster", "?1"),
    ("referrer-policy", "no-referrer"),
    ("strict-transport-security", "max-age=15552000; includeSubDomains"),
    ("x-content-type-options", "nosniff"),
    ("x-dns-prefetch-control", "off"),
    ("x-download-options", "noopen"),
    ("x-frame-options", "SAMEORIGIN"),
    ("x-permitted-cross-domain-policies", "none"),
    ("x-xss-protection", "0"),
];

pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    for (name, value) in SECURITY_HEADERS {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    headers.remove(header::SERVER);
    headers.remove("x-powered-by");

    response
}

/// One line per request with a fresh request id, echoed as `x-request-id`.
pub async fn access_logger(request: Request, next: Next) -> Response {
    let request_id = Uuid::now_v7().to_string();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let mut response = next.run(request).await;

    let status = response.status();
    let duration_ms = start.elapsed().as_millis();
    if status.is_server_error() {
        error!(request_id = %request_id, %method, %uri, %status, duration_ms, "request failed");
    } else if status.is_client_error() {
        warn!(request_id = %request_id, %method, %uri, %status, duration_ms, "request rejected");
    } else {
        info!(request_id = %request_id, %method, %uri, %status, duration_ms, "request completed");
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

pub async fn method_logger(request: Request, next: Next) -> Response {
    info!("{} Request", request.method());
    next.run(request).await
}

pub async fn add_name(State(config): State<Arc<Config>>, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(ServerName(config.server_name.clone()));
    next.run(request).await
}

/// Whether the moody gate turns a request away at this wall-clock second.
pub fn moody_blocks(second: u8) -> bool {
    second % 3 == 0
}

pub async fn gate(State(config): State<Arc<Config>>, request: Request, next: Next) -> Response {
    let refusal = match config.gate {
        GatePolicy::Open => None,
        GatePolicy::Lockout => Some("API lockout!"),
        GatePolicy::Moody if moody_blocks(time::OffsetDateTime::now_utc().second()) => Some("you shall not pass!"),
        GatePolicy::Moody => None,
    };

    match refusal {
        Some(message) => AppError::Forbidden(message).into_response(),
        None => next.run(request).await,
    }
}

pub async fn hubs_router_logger(request: Request, next: Next) -> Response {
    debug!(path = %request.uri().path(), "hubs router");
    next.run(request).await
}

/// Last resort for a panicking handler: 500 with the panic text.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic message".to_owned()
    };

    error!(panic = %detail, "handler panicked");
    (StatusCode::INTERNAL_SERVER_ERROR, message_body(detail)).into_response()
}
