//! Logging and tracing setup

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

use crate::cli::Args;

/// Installs the global subscriber and forwards `log` records from the
/// library into it.
pub fn init_telemetry(args: &Args) -> Result<()> {
    tracing_log::LogTracer::init().context("Failed to install log bridge")?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("Failed to create environment filter")?;

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if args.json_logs {
        let subscriber =
            registry.with(fmt::layer().json().with_target(true).with_current_span(true));
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = registry.with(fmt::layer().with_target(true).with_thread_names(true));
        tracing::subscriber::set_global_default(subscriber)
    };
    installed.context("Failed to install tracing subscriber")?;

    Ok(())
}
