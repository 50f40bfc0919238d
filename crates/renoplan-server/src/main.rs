//! Renoplan server - chat relay and renovation planning API.

use anyhow::Result;
use clap::Parser;
use renoplan_server::{app, config, logging, state};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use config::Config;
use logging::{LogConfig, LogFormat};
use state::AppState;

/// Renoplan server - renovation planning assistant API.
#[derive(Parser, Debug)]
#[command(name = "renoplan-server")]
#[command(about = "Chat relay and renovation planning API")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override port from config
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging (INFO level for all targets)
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace logging, including streamed chunks
    #[arg(long)]
    trace: bool,

    /// Quiet mode (WARN and ERROR only)
    #[arg(short, long)]
    quiet: bool,

    /// Set log level for specific targets (e.g., "products=debug").
    /// Can be repeated. Targets are prefixed with "renoplan::" automatically.
    #[arg(long = "log", value_name = "TARGET=LEVEL")]
    log_overrides: Vec<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from_cli(
        cli.verbose,
        cli.debug,
        cli.trace,
        cli.quiet,
        cli.log_overrides,
        cli.log_format,
    );
    logging::init(&log_config);

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(port) = cli.port {
        config.port = port;
    }

    if config.gateway.api_key.is_empty() {
        tracing::warn!(target: "renoplan::startup", "No AI gateway API key configured");
    }
    if config.scraper.api_key.is_empty() {
        tracing::warn!(target: "renoplan::startup", "No scraper API key configured; product search will fail");
    }
    tracing::info!(
        target: "renoplan::startup",
        "Loaded configuration (port: {}, db: {:?})",
        config.port,
        config.db_path
    );

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let state = Arc::new(AppState::new(config)?);
    tracing::info!(target: "renoplan::startup", "Opened store and gateway clients");

    let app = app(state);

    tracing::info!(target: "renoplan::startup", "Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
