//! mlprobe demo server.
//!
//! Serves the instrumented scoring service and its scrape endpoint.
//! The config file path comes from `MLPROBE_CONFIG` (default `mlprobe.yaml`).

use std::error::Error;
use std::net::SocketAddr;

use tracing_subscriber::{fmt, EnvFilter};

use mlprobe_axum::{config, router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = config::config_path();
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg
        .server
        .listen
        .parse()
        .map_err(|e| format!("server.listen must be a valid SocketAddr: {e}"))?;

    let app = router::build_router(&cfg)?;

    tracing::info!(%listen, config = %path.display(), "mlprobe starting");
    let listener = tokio::net::TcpListener::bind(listen).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
