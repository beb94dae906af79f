use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fleet_alerts_engine::{
    config::{ApiConfig, Config},
    engine::AlertEngine,
    server::Server,
    snapshot::{DriverSnapshot, OrderSnapshot, TruckSnapshot},
    sources::{FileSource, HttpSource, Sources},
};

#[derive(Parser, Debug)]
#[command(name = "fleet-alerts", about = "Operational alert engine for orders, drivers and trucks")]
struct Args {
    /// Address to serve the alert API on (overrides SERVER_ADDR)
    #[arg(long)]
    addr: Option<String>,

    /// Run a single evaluation pass, print the alerts as JSON and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    // Load configuration
    let mut config = Config::load().context("failed to load configuration")?;
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }
    info!("Loaded configuration: {:?}", config);

    let sources = build_sources(&config.api)?;
    let engine = Arc::new(AlertEngine::new(sources, config.engine.clone()));

    if args.once {
        engine.refresh_now().await?;
        println!("{}", serde_json::to_string_pretty(&engine.get_alerts())?);
        return Ok(());
    }

    engine.start()?;

    let server = Server::new(engine.clone());
    info!("Starting server on {}", config.server.addr);
    server
        .start(&config.server.addr, async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await?;

    engine.stop();
    Ok(())
}

fn build_sources(api: &ApiConfig) -> anyhow::Result<Sources> {
    if let Some(dir) = &api.fixtures_dir {
        info!("Reading snapshots from fixtures in {}", dir.display());
        return Ok(Sources::new(
            Arc::new(FileSource::<OrderSnapshot>::new(dir.join("orders.json"))),
            Arc::new(FileSource::<DriverSnapshot>::new(dir.join("drivers.json"))),
            Arc::new(FileSource::<TruckSnapshot>::new(dir.join("trucks.json"))),
        ));
    }

    let client = reqwest::Client::builder()
        .user_agent(concat!("fleet-alerts/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;
    let base = api.base_url()?;

    let orders = HttpSource::<OrderSnapshot>::new(client.clone(), &base, &api.orders_path)?
        .with_auth_token(api.token.clone());
    let drivers = HttpSource::<DriverSnapshot>::new(client.clone(), &base, &api.drivers_path)?
        .with_auth_token(api.token.clone());
    let trucks = HttpSource::<TruckSnapshot>::new(client, &base, &api.trucks_path)?
        .with_auth_token(api.token.clone());
    info!("Fetching snapshots from {}", base);

    Ok(Sources::new(Arc::new(orders), Arc::new(drivers), Arc::new(trucks)))
}
