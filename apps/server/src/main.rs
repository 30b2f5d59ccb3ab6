//! btaudio2mqtt - exposes Bluetooth speakers to Home Assistant over MQTT.
//!
//! Runs as a Home Assistant add-on: reads the configured devices from the
//! add-on options, announces them via MQTT discovery, publishes their state
//! and executes inbound commands until terminated.

mod config;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use btaudio_core::{bootstrap_services, BridgeError, ErrorCode};
use clap::Parser;
use tokio::signal;

use crate::config::ServerConfig;

/// Bluetooth audio sink to MQTT bridge.
#[derive(Parser, Debug)]
#[command(name = "btaudio2mqtt")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the bridge settings file (YAML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "BTAUDIO_LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// Options document listing the devices (overrides config file).
    #[arg(short = 'o', long, value_name = "FILE", env = "BTAUDIO_OPTIONS_PATH")]
    options: Option<PathBuf>,

    /// Seconds between state polls (overrides config file).
    #[arg(short = 'i', long, value_name = "SECS")]
    poll_interval: Option<u64>,

    /// Seconds to wait before exiting when no speakers are configured.
    #[arg(long, value_name = "SECS", default_value_t = 60)]
    exit_delay: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::info!("btaudio2mqtt v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config =
        ServerConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Apply CLI overrides
    if let Some(options) = args.options {
        config.options_path = options;
    }
    if let Some(secs) = args.poll_interval {
        config.poll_interval = secs;
    }

    log::info!("Configuration: {:?}", config);

    let core_config = config.to_core_config();
    let services = match bootstrap_services(&core_config) {
        Ok(services) => services,
        Err(e @ BridgeError::NoSpeakers(_)) => {
            log::error!("{}. Exiting in {}s.", e, args.exit_delay);
            tokio::time::sleep(Duration::from_secs(args.exit_delay)).await;
            std::process::exit(1);
        }
        Err(e) => {
            let code = e.code();
            return Err(e).with_context(|| format!("Failed to bootstrap services ({})", code));
        }
    };

    log::info!(
        "Services bootstrapped successfully: {} speaker(s)",
        services.speakers.len()
    );

    // Reconcile on this task until a shutdown signal arrives
    tokio::select! {
        _ = services.run() => {},
        _ = shutdown_signal() => {
            log::info!("Shutdown signal received, cleaning up...");
        }
    }

    services.shutdown().await;

    log::info!("Shutdown complete");
    Ok(())
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
