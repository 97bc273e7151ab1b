use anyhow::Result;
use colored::Colorize;
use ec2_price::{config, server};
use std::path::Path;
use tracing::{error, info};

/// Execute the start command
///
/// This will:
/// 1. Load configuration
/// 2. Start the server (blocks until shutdown)
pub async fn execute(config_path: &Path) -> Result<()> {
    println!("{}", "Starting EC2 price server...".green());

    let cfg = config::load_config(config_path)?;
    info!(
        "Starting EC2 price server on {}:{}",
        cfg.server.host, cfg.server.port
    );

    if let Err(e) = server::start_server(cfg).await {
        error!("Server failed: {:#}", e);
        return Err(e);
    }

    Ok(())
}
