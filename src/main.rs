//! socksd - SOCKS5 Proxy Server
//!
//! This is the main entry point for the socksd application.

use anyhow::{Context, Result};
use clap::Parser;
use socksd::config::{load_config, Config};
use socksd::socks::AuthMethod;
use socksd::Server;
use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::FmtSubscriber;

/// socksd - SOCKS5 proxy server with optional username/password authentication
#[derive(Parser, Debug)]
#[command(name = "socksd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides the configuration file
    #[arg(short, long)]
    listen: Option<String>,

    /// Require username/password authentication for NAME:PASS (repeatable)
    #[arg(short, long = "user", value_name = "NAME:PASS", value_parser = parse_user)]
    users: Vec<(String, String)>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Enable JSON logging format
    #[arg(long)]
    json_log: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = build_config(&args)?;

    // Setup logging
    setup_logging(config.server.debug, args.log_level.as_deref(), args.json_log)?;

    info!("socksd v{}", socksd::VERSION);
    if let Some(path) = &args.config {
        info!("Configuration loaded from: {:?}", path);
    }

    let server = Server::new(config.server).context("Invalid server configuration")?;

    // Setup shutdown signal
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        let _ = shutdown_tx_clone.send(true);
    });

    server.run(shutdown_rx).await?;
    Ok(())
}

/// Load the configuration file, if any, and apply command line overrides
fn build_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };

    if let Some(listen) = &args.listen {
        config.server.listen_addr = listen.clone();
    }
    if args.debug {
        config.server.debug = true;
    }
    if !args.users.is_empty() {
        config.server.auth.method = AuthMethod::Password;
        config.server.auth.users.extend(args.users.iter().cloned());
    }

    Ok(config)
}

fn parse_user(value: &str) -> Result<(String, String), String> {
    match value.split_once(':') {
        Some((name, pass)) if !name.is_empty() && !pass.is_empty() => {
            Ok((name.to_string(), pass.to_string()))
        }
        _ => Err(format!("expected NAME:PASS, got {:?}", value)),
    }
}

/// Resolve when Ctrl+C or SIGTERM arrives
async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        info!("Received Ctrl+C, shutting down...");
                    }
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down...");
                    }
                }
                return;
            }
            Err(e) => {
                tracing::warn!("Failed to setup SIGTERM handler: {}", e);
            }
        }
    }

    let _ = tokio::signal::ctrl_c().await;
    info!("Received Ctrl+C, shutting down...");
}

/// Setup logging based on configuration.
///
/// Without `debug` and without an explicit level nothing is logged.
fn setup_logging(debug: bool, level: Option<&str>, json: bool) -> Result<()> {
    let level = match level.map(str::to_lowercase).as_deref() {
        Some("trace") => LevelFilter::TRACE,
        Some("debug") => LevelFilter::DEBUG,
        Some("info") => LevelFilter::INFO,
        Some("warn") | Some("warning") => LevelFilter::WARN,
        Some("error") => LevelFilter::ERROR,
        Some("off") => LevelFilter::OFF,
        Some(_) => LevelFilter::INFO,
        None if debug => LevelFilter::DEBUG,
        None => LevelFilter::OFF,
    };

    if json {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}
