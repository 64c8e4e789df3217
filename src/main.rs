//! dartbridge - Main Entry Point
//!
//! Loads the configuration, sets up logging and runs the bridge until a
//! termination signal arrives.

use anyhow::Context;
use clap::Parser;
use dartbridge::{
    bridge::wait_for_shutdown_signal,
    config::{default_config_path, BridgeConfig},
    Bridge,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log filter used when RUST_LOG is not set
const DEFAULT_LOG_FILTER: &str = "info,dartbridge=debug";

/// Bridge Autodarts throw events to MQTT telemetry
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also write daily-rolling log files to this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Print a sample configuration and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.print_config {
        return match BridgeConfig::sample().to_toml() {
            Ok(text) => {
                print!("{}", text);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("dartbridge: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging(args.log_dir.as_deref());

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("dartbridge: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "dartbridge.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}

fn run(args: Args) -> anyhow::Result<()> {
    let path = args
        .config
        .or_else(default_config_path)
        .context("No config directory on this platform; pass --config")?;
    let config = BridgeConfig::load(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

    tracing::info!(config = %path.display(), "Starting dartbridge");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("dartbridge")
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async {
        let bridge = Bridge::connect(&config)?;

        let cancel = CancellationToken::new();
        tokio::spawn({
            let cancel = cancel.clone();
            async move {
                match wait_for_shutdown_signal().await {
                    Ok(()) => {
                        tracing::info!("Shutdown signal received");
                        cancel.cancel();
                    }
                    Err(e) => tracing::error!("Failed to install signal handlers: {}", e),
                }
            }
        });

        bridge.run(cancel).await?;
        tracing::info!("dartbridge stopped");
        Ok::<(), anyhow::Error>(())
    })
}
