//! geosite-pt - tracker domain list builder
//!
//! Collects the tracker hostnames of private torrents from qBittorrent and
//! Transmission and writes them as a v2ray geosite list, so routing rules can
//! send tracker traffic through a dedicated outbound.

use anyhow::{bail, Result};
use clap::Parser;
use tracing::{debug, info};

mod cli;
mod client;
mod config;
mod geosite;
mod service;
mod tracker;
mod utils;

use cli::Cli;
use config::Settings;
use service::{HarvestResult, HarvestService};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geosite_pt=info".into()),
        )
        .init();

    info!("Starting geosite-pt v{}", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load(&cli)?;
    if let Some(path) = settings.config_path() {
        info!("Configuration loaded from {:?}", path);
    }

    let service = HarvestService::new(&settings);
    match service.run().await? {
        HarvestResult::Written {
            backends,
            path,
            domains,
        } => {
            info!(
                "Wrote {} domains from {} backends to {}",
                domains.len(),
                backends,
                path.display()
            );
            Ok(())
        }
        HarvestResult::Skipped { backends, failures } => {
            for failure in &failures {
                debug!("Failed backend {}: {}", failure.endpoint, failure.error);
            }
            bail!(
                "Errors occurred in {} of {} backends; file write skipped",
                failures.len(),
                backends
            )
        }
    }
}
