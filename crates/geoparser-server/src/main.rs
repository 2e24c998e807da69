//! GeoParser API Server - REST backend for text-to-place geoparsing.
//!
//! This binary wires the geoparser-core orchestration layer to an HTTP
//! surface. Models are pre-loaded at startup through the recognizer sidecar;
//! a startup where zero models load is fatal.

mod handlers;
mod server;

use anyhow::Result;
use clap::Parser;
use geoparser_core::{GeoParserService, RemoteRecognizerLoader, ServiceConfig};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "geoparser-server")]
#[command(about = "REST API server for the geoparser service")]
struct Args {
    /// Port to listen on (overrides PORT; 0 = auto-assign)
    #[arg(short, long)]
    port: Option<u16>,

    /// Host to bind to (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServiceConfig::from_env();
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    // Set up logging
    let log_level = if args.debug {
        Level::DEBUG
    } else {
        config.log_level.parse().unwrap_or(Level::INFO)
    };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("Starting GeoParser API server");

    let loader = RemoteRecognizerLoader::new(
        config.recognizer_url.clone(),
        config.transformer_model.clone(),
        config.gazetteer.clone(),
        config.load_timeout,
    );

    let host = config.host.clone();
    let port = config.port;

    // Pre-load all configured models; zero successes refuses to serve.
    let service = GeoParserService::new(config, &loader).await?;

    let addr = server::start_server(service, &host, port).await?;
    info!("GeoParser API running on {}", addr);

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");

    Ok(())
}
