//! `server-group`: run several HTTP servers as one unit.
//!
//! ```text
//! server-group --config group.toml --server api=0.0.0.0:8080 --signal terminate
//! ```
//!
//! Every configured server is started at once. When one of them stops, or an
//! interrupt signal arrives, all of them are shut down under the configured
//! timeout. Each error is logged and any error makes the exit code non-zero.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tower::Layer;

use server_group::config::loader::{load_config, ConfigError};
use server_group::config::validation::validate_config;
use server_group::config::{GroupConfig, ServerConfig};
use server_group::http::{status_router, HttpServer};
use server_group::observability::{logging, metrics};
use server_group::{Group, LifecycleHooks, LifecycleLayer, Server, Signal};

#[derive(Parser)]
#[command(name = "server-group")]
#[command(about = "Run several HTTP servers and shut them down together", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Additional server, as NAME=ADDR. May be repeated.
    #[arg(short, long = "server", value_name = "NAME=ADDR", value_parser = parse_server)]
    servers: Vec<ServerConfig>,

    /// Shutdown budget shared by all servers, in milliseconds.
    #[arg(long)]
    shutdown_timeout_ms: Option<u64>,

    /// Signal that interrupts the group. May be repeated; replaces the configured set.
    #[arg(long = "signal", value_enum)]
    signals: Vec<Signal>,
}

fn parse_server(value: &str) -> Result<ServerConfig, String> {
    match value.split_once('=') {
        Some((name, address)) if !name.is_empty() && !address.is_empty() => Ok(ServerConfig::new(name, address)),
        _ => Err(format!("expected NAME=ADDR, got '{value}'")),
    }
}

fn load(cli: Cli) -> Result<GroupConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GroupConfig::default(),
    };

    config.servers.extend(cli.servers);
    if let Some(timeout_ms) = cli.shutdown_timeout_ms {
        config.shutdown.timeout_ms = timeout_ms;
    }
    if !cli.signals.is_empty() {
        config.shutdown.signals = cli.signals;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn build_server(config: &ServerConfig) -> Result<Arc<dyn Server>, std::net::AddrParseError> {
    let address: SocketAddr = config.bind_address.parse()?;
    let router = status_router(&config.name, config.request_timeout());
    let server = HttpServer::new(config.name.clone(), address, router);

    let (serving, served, stopping, stopped) = (
        config.name.clone(),
        config.name.clone(),
        config.name.clone(),
        config.name.clone(),
    );
    let hooks = LifecycleHooks::new()
        .before_serve(move || tracing::info!(server = %serving, "Server starting"))
        .after_serve(move |err| match err {
            Some(e) => tracing::error!(server = %served, error = %e, "Server failed"),
            None => tracing::info!(server = %served, "Server finished serving"),
        })
        .before_shutdown(move || tracing::info!(server = %stopping, "Server shutting down"))
        .after_shutdown(move |err| match err {
            Some(e) => tracing::error!(server = %stopped, error = %e, "Server shutdown failed"),
            None => tracing::info!(server = %stopped, "Server shut down"),
        });

    Ok(Arc::new(LifecycleLayer::new(hooks).layer(server)))
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = load(Cli::parse())?;

    logging::init_logging(&config.observability)?;
    tracing::info!("server-group v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        if let Err(e) = metrics::init_metrics(addr) {
            tracing::error!(error = %e, "Failed to start metrics exporter");
        }
    }

    let servers = config
        .servers
        .iter()
        .map(build_server)
        .collect::<Result<Vec<_>, _>>()?;

    if servers.is_empty() {
        tracing::warn!("No servers configured, nothing to run");
        return Ok(ExitCode::SUCCESS);
    }

    tracing::info!(
        servers = servers.len(),
        timeout_ms = config.shutdown.timeout_ms,
        signals = ?config.shutdown.signals,
        "Configuration loaded"
    );

    let errors = Group::from_config(&config.shutdown).run(servers).await;
    if errors.is_empty() {
        tracing::info!("Shutdown complete");
        return Ok(ExitCode::SUCCESS);
    }

    for error in &errors {
        tracing::error!(
            index = error.index(),
            server = %config.servers[error.index()].name,
            phase = %error.phase(),
            error = %error.server_error(),
            "Server group error"
        );
    }
    Ok(ExitCode::FAILURE)
}
