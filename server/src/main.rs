mod app;
mod cli;
mod error;
mod routes;
mod telemetry;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use fincrew::config::{load_config, AppConfig};

use crate::app::App;
use crate::cli::Args;
use crate::telemetry::init_telemetry;

/// Synchronous entry point: the blocking completion client and worker pool are
/// built before the runtime exists and torn down after it is gone.
fn main() -> Result<()> {
    let args = Args::parse();
    init_telemetry(&args)?;

    info!("Starting Financial Document Analyzer v{}", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AppConfig::default(),
    };

    let app = App::build(&config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("fincrew-http")
        .build()
        .context("Failed to build async runtime")?;

    let result = runtime.block_on(serve(&args, &app));
    drop(runtime);

    if let Err(ref e) = result {
        error!("Server error: {:#}", e);
    }

    info!("Waiting for queued analyses to finish...");
    app.shutdown();
    info!("Server shutdown complete");

    result
}

async fn serve(args: &Args, app: &App) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", args.host, args.port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, routes::router(app.state()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
