use anyhow::{Context, Result};
use clap::Parser;
use pushbox_application::{ReconciliationController, StartupOptions};
use pushbox_infrastructure::{ConfigService, MemoryGateway};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod presenter;

use presenter::TextPresenter;

#[derive(Parser)]
#[command(name = "pushbox")]
#[command(about = "pushbox - mirror a push-notification inbox locally", long_about = None)]
struct Cli {
    /// Config file (defaults to $PUSHBOX_CONFIG, then ~/.config/pushbox/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON fixture for the in-process gateway (overrides the config)
    #[arg(long)]
    fixture: Option<PathBuf>,

    /// Enable live delivery on startup
    #[arg(long)]
    live: bool,

    /// Skip the startup refresh
    #[arg(long)]
    no_refresh: bool,

    /// Publish a notification payload at the gateway (delivered live if enabled)
    #[arg(long = "push", value_name = "JSON", value_parser = parse_payload)]
    pushes: Vec<Value>,

    /// Simulate tapping a notification payload
    #[arg(long = "tap", value_name = "JSON", value_parser = parse_payload)]
    taps: Vec<Value>,

    /// Remove a notification by seqno
    #[arg(long = "remove", value_name = "SEQNO")]
    removals: Vec<String>,

    /// Act on a notification by seqno
    #[arg(long = "action", value_name = "SEQNO")]
    actions: Vec<String>,
}

fn parse_payload(raw: &str) -> std::result::Result<Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid JSON payload: {e}"))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(
            "pushbox=info,pushbox_core=info,pushbox_application=info,pushbox_infrastructure=info",
        )
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config_service = match &cli.config {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::new_default()?,
    };
    let config = config_service
        .get_config()
        .with_context(|| format!("Failed to load config from {:?}", config_service.path()))?;

    let gateway = match cli.fixture.as_ref().or(config.fixture.as_ref()) {
        Some(path) => Arc::new(
            MemoryGateway::from_fixture_file(path)
                .with_context(|| format!("Failed to load fixture {:?}", path))?,
        ),
        None => Arc::new(MemoryGateway::new()),
    };

    let mut options = StartupOptions::from(&config);
    options.live_delivery |= cli.live;
    if cli.no_refresh {
        options.refresh = false;
    }

    let controller = ReconciliationController::new(gateway.clone(), Arc::new(TextPresenter));
    let mut events = controller.start(options).await?;

    for payload in cli.pushes {
        gateway.publish(payload)?;
    }
    for payload in cli.taps {
        gateway.tap(payload)?;
    }
    controller.drain_events(&mut events).await;

    for seqno in &cli.removals {
        controller.remove(seqno).await;
    }

    for seqno in &cli.actions {
        match controller.action(seqno).await {
            Some(action) => match &action.payload {
                Some(payload) => println!("{}: {}", seqno, payload),
                None => println!("{}: {}", seqno, action.record.message),
            },
            None => tracing::debug!("No notification {} to act on", seqno),
        }
    }

    controller.disable_live_delivery().await?;
    Ok(())
}
