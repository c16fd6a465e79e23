//! Divvy Fetcher CLI application
//!
//! Command-line interface for mirroring Divvy bike trip data archives.

use std::process;

use tracing::{debug, info};

use divvy_fetcher::cli::{handle_fetch, init_logging, Cli};
use divvy_fetcher::config::AppConfig;
use divvy_fetcher::errors::Result;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();
    let log_control = init_logging(&cli);
    info!("Divvy Fetcher v{} starting", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load(cli.global.config.clone()).await?;
    if log_control.apply_configured_level(&config.logging.level) {
        debug!("Log level set to {} from configuration", config.logging.level);
    }

    handle_fetch(&cli, config).await
}
