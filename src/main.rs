//! swrrlb - per-service smoothed weighted round-robin instance selection
//!
//! Usage:
//!     swrrlb --config <path>
//!
//! See --help for more options.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use swrrlb::config::{load_config, Config, ConfigWatcher};
use swrrlb::metrics::StatusServer;
use swrrlb::state::AppState;
use swrrlb::util::init_logging;

/// Per-service smoothed weighted round-robin instance selection.
#[derive(Parser, Debug)]
#[command(name = "swrrlb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,

    /// Print successive picks for a service and exit
    #[arg(long, value_name = "SERVICE")]
    select: Option<String>,

    /// Number of picks to print with --select
    #[arg(short = 'n', long, default_value_t = 1)]
    count: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli.config).with_context(|| {
        format!(
            "failed to load configuration from '{}'",
            cli.config.display()
        )
    })?;

    // CLI overrides config
    let log_level = cli
        .log_level
        .as_deref()
        .unwrap_or(&config.global.log_level);

    init_logging(log_level, &config.global.log_format)
        .context("failed to initialize logging")?;

    if cli.validate {
        info!("Configuration is valid");
        println!("Configuration is valid.");
        println!("  Algorithm: {:?}", config.balancer.algorithm);
        println!("  Services: {}", config.services.len());
        for service in &config.services {
            let healthy = service.instances.iter().filter(|i| i.healthy).count();
            println!(
                "    - {} ({} instances, {} healthy)",
                service.name,
                service.instances.len(),
                healthy
            );
        }
        return Ok(());
    }

    let state = AppState::new(config.clone()).context("failed to build service catalog")?;

    if let Some(service) = cli.select.as_deref() {
        for _ in 0..cli.count {
            match state.selector().select_instance(service) {
                Some(instance) => println!("{}", instance.address),
                None => println!("<none>"),
            }
        }
        return Ok(());
    }

    info!(
        application = %config.global.application_name,
        config_path = %cli.config.display(),
        services = config.services.len(),
        algorithm = ?config.balancer.algorithm,
        "swrrlb starting"
    );

    for service in &config.services {
        info!(
            name = %service.name,
            instances = service.instances.len(),
            "configured service"
        );
    }

    run(config, state, cli.config)
}

/// Run the status server and config watcher.
fn run(config: Config, state: AppState, config_path: PathBuf) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    runtime.block_on(async { run_async(config, state, config_path).await })
}

/// Async entry point.
async fn run_async(config: Config, state: AppState, config_path: PathBuf) -> Result<()> {
    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let mut handles = Vec::new();

    let status = &config.global.status;
    if status.enabled {
        let server = StatusServer::bind(status.address, status.path.clone(), state.clone())
            .await
            .with_context(|| format!("failed to bind status server on {}", status.address))?;
        let shutdown_rx = shutdown_tx.subscribe();
        handles.push(tokio::spawn(async move {
            server.run(shutdown_rx).await;
        }));
    }

    let watch = &config.global.watch;
    if watch.enabled {
        let reload_state = state.clone();
        let watcher = ConfigWatcher::new(
            config_path,
            watch.poll_interval,
            Box::new(move |new_config| {
                if let Err(e) = reload_state.apply_config(new_config) {
                    warn!(error = %e, "configuration reload rejected");
                }
            }),
        );
        let shutdown_rx = shutdown_tx.subscribe();
        handles.push(tokio::spawn(async move {
            watcher.run(shutdown_rx).await;
        }));
    }

    info!("swrrlb is running");
    info!("press Ctrl+C to stop");

    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("received shutdown signal");
        }
        Err(e) => {
            error!(error = %e, "failed to listen for shutdown signal");
        }
    }

    let _ = shutdown_tx.send(());

    for handle in handles {
        let _ = handle.await;
    }

    info!("swrrlb shut down complete");
    Ok(())
}
