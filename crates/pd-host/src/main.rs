//! PlanDrop native messaging host
//!
//! Launched by the browser with the extension origin as an argument. Speaks
//! length-prefixed JSON on stdin/stdout and relays each request to a remote
//! machine through the system ssh and scp executables.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use pd_core::config::{self, RelayConfig};
use pd_core::error::ConfigError;
use pd_host::{serve, Dispatcher, LoggingContext};

#[derive(Parser)]
#[command(name = "plandrop-host")]
#[command(about = "PlanDrop native messaging host - relays extension requests over SSH")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "PLANDROP_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log file (defaults to the configured log file)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Caller identification passed by the browser (origin, or manifest
    /// path and extension id)
    #[arg(hide = true)]
    caller: Vec<String>,

    /// Native window handle of the calling browser (Windows)
    #[arg(long, hide = true)]
    parent_window: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(config::default_config_path);
    let (config, config_error) = match config::load_config::<RelayConfig>(&config_path) {
        Ok(config) => (config, None),
        Err(ConfigError::NotFound(_)) => (RelayConfig::default(), None),
        Err(e) => (RelayConfig::default(), Some(e)),
    };

    let log_file = args.log_file.clone().unwrap_or_else(|| config.log_file.clone());
    let logging = LoggingContext::init(&log_file, &args.log_level);

    tracing::info!("PlanDrop host starting (pid {})", std::process::id());
    if let Some(e) = config_error {
        tracing::warn!("Failed to load config from {:?}: {}", config_path, e);
    }
    if !args.caller.is_empty() {
        tracing::info!("Caller: {}", args.caller.join(" "));
    }
    if let Some(window) = &args.parent_window {
        tracing::debug!("Parent window: {}", window);
    }

    let transport = config.transport();
    let dispatcher = Dispatcher::new(transport, config);

    let result = serve(tokio::io::stdin(), tokio::io::stdout(), &dispatcher).await;

    match result {
        Ok(handled) => {
            tracing::info!("PlanDrop host exiting after {} requests", handled);
            logging.shutdown();
            Ok(())
        }
        Err(e) => {
            tracing::error!("Fatal framing error: {}", e);
            logging.shutdown();
            Err(e).context("Cannot read message from browser")
        }
    }
}
