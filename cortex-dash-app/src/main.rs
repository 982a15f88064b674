use anyhow::{Context, Result};
use cortex_dash_app::config::{Config, CONFIG_PATH_ENV};
use cortex_dash_app::input::HELP;
use cortex_dash_app::Session;
use cortex_dash_core::Dashboard;
use cortex_dash_interfaces::{Interface, TerminalInterface};
use cortex_dash_transport::{ConnectionManager, WsConnector};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if matches!(args.get(1).map(String::as_str), Some("-h" | "--help")) {
        println!("Usage: cortex-dash [CONFIG.yaml]");
        println!();
        println!("{}", HELP);
        return Ok(());
    }

    let config_path = args
        .get(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from));

    let mut config = match Config::load_or_default(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config: {}", e);
            return Err(e.into());
        }
    };
    config.apply_env_overrides();
    if let Err(e) = config.validate() {
        eprintln!("❌ Invalid configuration: {}", e);
        return Err(e.into());
    }

    init_tracing(&config.log_level);
    let url = config.endpoint().context("Failed to resolve endpoint")?;

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║              Cortex Dash                                         ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");

    let interface: Arc<dyn Interface> = Arc::new(TerminalInterface::new());
    interface.show_status(&format!("Endpoint: {}", url)).await;
    interface.show_status("Type :help for local actions").await;

    let (manager, handle, events) =
        ConnectionManager::new(WsConnector::new(), url, config.backoff_policy());
    let connection = manager.spawn();
    let input = spawn_input_reader(interface.clone());

    let session = Session::new(
        Dashboard::new(config.dashboard_config()),
        handle,
        interface,
    );

    tokio::select! {
        _ = session.run(events, input) => {}
        _ = tokio::signal::ctrl_c() => {
            println!();
            println!("👋 Goodbye!");
        }
    }

    connection.abort();
    Ok(())
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Read lines on their own task so a partially typed line survives the select loop.
fn spawn_input_reader(interface: Arc<dyn Interface>) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(32);
    tokio::spawn(async move {
        while let Some(line) = interface.receive_input().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });
    rx
}
