//! poh-proxy CLI entry point.

mod cli;

use clap::Parser;
use cli::Cli;
use poh_proxy::ProxyBuilder;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse CLI arguments
    let cli = Cli::parse();
    let log_json = cli.log_json;

    // Build configuration
    let config = cli.into_config()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if log_json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    info!("poh-proxy v{}", env!("CARGO_PKG_VERSION"));

    // Build and run the proxy
    let mut proxy = ProxyBuilder::new(config).build().await?;

    // Run until shutdown
    proxy.run().await?;

    info!("Goodbye!");
    Ok(())
}
