pub mod appresult;
pub mod config;
pub mod db;
pub mod guard;
pub mod hubs;
pub mod index;
pub mod middleware;
pub mod res;

use std::{ops::Deref, sync::Arc};

use axum::{
    extract::FromRef,
    middleware::{from_fn, from_fn_with_state},
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use sqlx::SqlitePool;
use tower::{Layer, ServiceBuilder};
use tower_http::{catch_panic::CatchPanicLayer, normalize_path::{NormalizePath, NormalizePathLayer}};

pub use appresult::{AppError, AppResult};
use config::Config;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: Arc<Config>,
}

/// The whole service. Global middleware runs top to bottom before any route.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index::index))
        .nest("/api/hubs", hubs::router())
        .method_not_allowed_fallback(index::not_found)
        .fallback(index::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(middleware::security_headers))
                .layer(from_fn(middleware::access_logger))
                .layer(from_fn(middleware::method_logger))
                .layer(from_fn_with_state(state.config.clone(), middleware::add_name))
                .layer(from_fn_with_state(state.config.clone(), middleware::gate))
                .layer(CatchPanicLayer::custom(middleware::handle_panic)),
        )
        .with_state(state)
}

/// [`app`] behind trailing-slash trimming, so `/api/hubs/` routes like `/api/hubs`.
/// Runs before routing, which a layer inside the `Router` can't.
pub fn service(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(app(state))
}

/// Markdown rendered to HTML. Placeholders are filled after parsing, so the
/// values show up as plain text.
pub struct Markdown<T> {
    source: T,
    vars: Vec<(&'static str, String)>,
}

impl<T> Markdown<T> {
    pub fn new(source: T) -> Self {
        Self { source, vars: Vec::new() }
    }

    pub fn var(mut self, placeholder: &'static str, value: impl Into<String>) -> Self {
        self.vars.push((placeholder, value.into()));
        self
    }
}

impl<T> IntoResponse for Markdown<T>
where
    T: Deref<Target = str>
{
    fn into_response(self) -> axum::response::Response {
        use pulldown_cmark::{html, Event, Parser, TextMergeStream};

        let vars = &self.vars;
        let events = TextMergeStream::new(Parser::new(&self.source)).map(|event| match event {
            Event::Text(text) if vars.iter().any(|(placeholder, _)| text.contains(placeholder)) => {
                let filled = vars
                    .iter()
                    .fold(text.into_string(), |text, (placeholder, value)| text.replace(placeholder, value));
                Event::Text(filled.into())
            }
            other => other,
        });

        let mut html_output = String::new();
        html::push_html(&mut html_output, events);
        Html(html_output).into_response()
    }
}
