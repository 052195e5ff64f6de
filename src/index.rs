use axum::{
    debug_handler,
    extract::Extension,
    extract::OriginalUri,
    http::{Method, StatusCode},
    response::IntoResponse,
};

use crate::{appresult::message_body, include_res, middleware::ServerName, Markdown};

#[debug_handler]
pub async fn index(name: Option<Extension<ServerName>>) -> impl IntoResponse {
    let name = match name {
        Some(Extension(ServerName(name))) => format!(" {name}"),
        None => String::new(),
    };

    Markdown::new(include_res!(str, "/pages/index.md")).var("{name}", name)
}

/// Unknown paths, and known paths hit with a method they don't serve.
pub async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> impl IntoResponse {
    (StatusCode::NOT_FOUND, message_body(format!("Cannot {method} {}", uri.path())))
}
