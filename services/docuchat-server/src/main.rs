//! DocuChat Server - Main entry point.

use anyhow::Result;
use docuchat_common::config::Config;
use docuchat_common::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load_with_env()?;

    // Initialize logging
    init_logging(
        &config.observability.log_level,
        &config.observability.log_format,
    );

    tracing::info!("DocuChat Server v{}", env!("CARGO_PKG_VERSION"));

    // Start the server
    docuchat_server::start_server(&config).await
}
