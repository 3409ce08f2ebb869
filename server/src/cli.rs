//! Command-line argument parsing

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "fincrew-server",
    about = "Financial Document Analyzer API",
    version,
    long_about = "Accepts PDF uploads, runs them through a staged language-model \
                  analysis in the background and stores the final recommendation."
)]
pub struct Args {
    /// Path to a JSON configuration file. Built-in defaults apply when omitted.
    #[arg(short, long, env = "FINCREW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "FINCREW_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// HTTP server port
    #[arg(short, long, env = "PORT", default_value = "8000")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short,
        long,
        env = "LOG_LEVEL",
        default_value = "info",
        value_parser = ["trace", "debug", "info", "warn", "error"]
    )]
    pub log_level: String,

    /// Enable JSON log format
    #[arg(long, env = "JSON_LOGS")]
    pub json_logs: bool,
}
