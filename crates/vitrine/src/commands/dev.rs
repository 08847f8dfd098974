//! Development server command.

use std::path::Path;

use anyhow::Result;
use vitrine_server::DevServer;

use super::config::Config;

/// Run the dev server.
pub async fn run(config_path: &Path, port: Option<u16>, open: bool) -> Result<()> {
    let config = Config::load(config_path)?.server_config(port, open);

    tracing::info!("Starting development server on port {}", config.port);

    DevServer::new(config).start().await?;

    Ok(())
}
