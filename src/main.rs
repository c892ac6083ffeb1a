//! Confstore - Centralized Configuration Store
//!
//! Serves named configuration values over HTTP, seeds built-in defaults at
//! startup, and streams change events to subscribers.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use confstore::{
    config::{ConfigManager, ServiceConfig},
    events::BroadcastNotifier,
    management::{AppState, ManagementServer},
    metrics::Metrics,
    ConfigService, DefaultConfig, MemoryEntryStore, ShutdownCoordinator,
};

/// CLI arguments for Confstore
#[derive(Parser, Debug)]
#[command(name = "confstore")]
#[command(about = "Confstore - Centralized configuration store")]
#[command(version)]
#[command(long_about = "
Confstore - Centralized configuration store

Configuration priority (highest to lowest):
1. Command-line arguments
2. Configuration file
3. Environment variables
4. Built-in defaults

Environment variables:
  CONFSTORE_BIND_ADDR         - Bind address (e.g., 127.0.0.1:7070)
  CONFSTORE_SHUTDOWN_TIMEOUT  - Graceful shutdown timeout (e.g., 10s)
  CONFSTORE_DEFAULTS_PATH     - Default values file (json, yaml or toml)
  CONFSTORE_LOG_LEVEL         - Log level (trace, debug, info, warn, error)
  CONFSTORE_EXPOSE_INTERNAL   - Mount full-dump and migrate routes (true/false)
")]
pub struct CliArgs {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "confstore.toml",
        help = "Path to configuration file"
    )]
    pub config: PathBuf,

    /// Bind address (overrides config file)
    #[arg(short, long, help = "Bind address (e.g., 127.0.0.1:7070)")]
    pub bind: Option<String>,

    /// Port to bind to (overrides config file)
    #[arg(short, long, help = "Port to bind to")]
    pub port: Option<u16>,

    /// Default values file (overrides config file)
    #[arg(short, long, help = "Default values file (json, yaml or toml)")]
    pub defaults: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, help = "Log level")]
    pub log_level: Option<String>,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration and exit")]
    pub validate_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    let mut config = ConfigManager::load_from_file(&args.config)?;

    config.merge_with_cli_args(
        args.bind.as_deref(),
        args.port,
        args.defaults.as_deref(),
        args.log_level.as_deref(),
    );

    init_tracing(&args, &config)?;

    info!("Starting Confstore v{}", env!("CARGO_PKG_VERSION"));

    config
        .validate()
        .context("Final configuration validation failed")?;

    let defaults = ConfigManager::load_defaults(&config).context("Failed to load default configuration")?;

    if args.validate_config {
        print_summary(&config, &defaults);
        return Ok(());
    }

    let store = Arc::new(MemoryEntryStore::new());
    let notifier = BroadcastNotifier::new(config.notifications.channel_capacity);
    let metrics = Arc::new(Metrics::new().context("Failed to register metrics")?);

    let service = Arc::new(
        ConfigService::new(store, Arc::new(notifier.clone()), Arc::new(defaults))
            .with_metrics(metrics.clone()),
    );

    let shutdown = ShutdownCoordinator::new(config.server.shutdown_timeout);

    let mut app_state = AppState::new(service.clone(), config.management.clone()).with_events(notifier);
    if config.monitoring.prometheus_enabled {
        app_state = app_state.with_metrics(metrics);
    }

    let server = ManagementServer::new(config.server.bind_addr, app_state);
    let server_handle = tokio::spawn(server.start(shutdown.shutdown_signal()));

    // Early requests may see a partially seeded store until this completes
    match service.migrate().await {
        Ok(report) => info!(
            created = report.created.len(),
            updated = report.updated.len(),
            overridden = report.overridden,
            "Initial reconciliation complete"
        ),
        Err(e) => {
            error!("Initial reconciliation failed: {}", e);
            shutdown.trigger();
            shutdown.drain("Management API server", server_handle).await?;
            return Err(e).context("Failed to reconcile default configuration");
        }
    }

    info!("Confstore ready on {}", config.server.bind_addr);

    tokio::select! {
        result = shutdown.listen_for_signals() => {
            if let Err(e) = result {
                error!("Error setting up signal handlers: {}", e);
                shutdown.trigger();
            }
        }
        _ = shutdown.shutdown_signal() => {}
    }

    info!("Initiating graceful shutdown (timeout {:?})...", shutdown.timeout());
    shutdown.drain("Management API server", server_handle).await?;
    info!("Server shutdown complete");

    Ok(())
}

/// Install the fmt subscriber; `RUST_LOG` wins over the configured level
fn init_tracing(args: &CliArgs, config: &ServiceConfig) -> Result<()> {
    let log_level = if args.verbose {
        "debug"
    } else {
        config.monitoring.log_level.as_str()
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_level(true),
        )
        .with(env_filter)
        .try_init()
        .context("Failed to initialize tracing")?;

    Ok(())
}

fn print_summary(config: &ServiceConfig, defaults: &DefaultConfig) {
    info!("Configuration is valid");
    info!("  Bind address: {}", config.server.bind_addr);
    info!("  Shutdown timeout: {:?}", config.server.shutdown_timeout);
    info!("  Default keys: {}", defaults.len());
    info!(
        "  Internal routes: {}",
        if config.management.expose_internal { "enabled" } else { "disabled" }
    );
    info!(
        "  Prometheus metrics: {}",
        if config.monitoring.prometheus_enabled { "enabled" } else { "disabled" }
    );
}
