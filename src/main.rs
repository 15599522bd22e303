mod browser;
mod cli;
mod config;
mod error;
mod models;
mod search;
mod sites;

use browser::BrowserManager;
use config::Config;
use error::{AppError, Result};
use sites::LiveSource;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("shopscout=info")),
        )
        .init();

    let config = Config::default();
    if let Err(errors) = config.validate() {
        for error in &errors {
            tracing::error!("Invalid configuration: {}", error);
        }
        return Err(AppError::InvalidInput(
            "configuration validation failed".to_string(),
        ));
    }

    info!("Launching browser...");
    let manager = BrowserManager::launch(&config).await?;
    let source = LiveSource::new(&manager);

    let outcome = cli::run(&source, &config).await;
    drop(source);

    if let Err(e) = manager.close().await {
        warn!("Error during browser shutdown: {}", e);
    }

    outcome
}
