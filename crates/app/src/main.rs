//! Nimbus - Main Entry Point
//!
//! Command-line front end for the reporting API: parses arguments,
//! initializes logging and runs one command against the stored session.

mod app;
mod cli;

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;
use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.connection.resolve()?;
    tracing::debug!(base_url = %config.base_url, "starting nimbus v{}", env!("CARGO_PKG_VERSION"));

    let app = App::connect(config)?;
    app.run(cli.command).await
}
