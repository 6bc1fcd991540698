//! CM download API binary entry point.
//!
//! Thin wrapper around the cm-download-api library: initializes logging,
//! loads and validates configuration, then runs the server.

use anyhow::Result;
use cm_download_api::{Server, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("CM download API starting...");

    let config = ServerConfig::from_args();

    tracing::info!(
        "Configuration loaded: HTTP={}, source={:?}, mode={:?}",
        config.http_bind,
        config.source,
        config.source_mode
    );

    config.validate()?;

    let server = Server::new(config)?;
    server.run().await?;

    Ok(())
}
