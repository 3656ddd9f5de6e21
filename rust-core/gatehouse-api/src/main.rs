// SPDX-License-Identifier: PMPL-1.0-or-later
//! Gatehouse API server binary
//!
//! Starts the HTTP front-end for the gateway.

use gatehouse_api::ServerConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        "Starting Gatehouse API server on {}:{}",
        config.host,
        config.port
    );

    gatehouse_api::serve(config).await?;

    Ok(())
}
