use std::sync::Arc;

use anyhow::Context;
use axum::{extract::Request, ServiceExt};
use hubs::{config::Config, db, service, AppState};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // loads .env before the filter reads RUST_LOG
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hubs=debug".into())
        )
        .init();

    info!(gate = %config.gate, legacy_status_codes = config.legacy_status_codes, "loaded configuration");

    let db_pool = db::connect(&config.database_url, config.max_connections)
        .await
        .with_context(|| format!("connecting to {}", config.database_url))?;
    db::create_tables(&db_pool).await.context("creating tables")?;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    info!("listening on {}", config.bind_addr);

    let service = service(AppState {
        db_pool,
        config: Arc::new(config),
    });
    axum::serve(listener, ServiceExt::<Request>::into_make_service(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
