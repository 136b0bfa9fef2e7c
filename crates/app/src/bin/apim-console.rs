// APIM Console - group membership command line

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use apim_common::config::Config;
use apim_common::Error;
use apim_console::cli::Cli;
use apim_management::{ManagementApiFactory, ManagementConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    apim_console::init_tracing(&config);
    info!(provider = %config.provider, "Configuration loaded successfully");

    let api = ManagementApiFactory::create(ManagementConfig::from_config(&config)).map_err(|e| {
        error!("Failed to create management API client: {}", e);
        e
    })?;

    let output = apim_console::commands::execute(Arc::from(api), cli.command, cli.admin)
        .await
        .map_err(|e| {
            let code = e
                .downcast_ref::<Error>()
                .map(Error::error_code)
                .unwrap_or("UNEXPECTED_ERROR");
            error!(code, "Command failed: {:#}", e);
            e
        })?;

    print!("{}", output);
    Ok(())
}
