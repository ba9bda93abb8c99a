use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use latency_observatory::{server, AppState, Config};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::parse();
    let bind = config.bind;
    if let Some(pin) = &config.pin {
        info!(%pin, "starting with pinned primary key");
    }

    let state = Arc::new(AppState::new(config));
    let app = server::create_router(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;

    info!(%bind, "typing latency observatory listening");
    info!("samples    → POST /api/samples");
    info!("metrics    → GET  /api/metrics");
    info!("stream     → GET  /api/metrics/stream");
    info!("report     → GET  /api/report");

    axum::serve(listener, app).await.context("server exited with error")?;
    Ok(())
}
