use anyhow::Result;
use cinevault::config::Config;
use dotenvy::dotenv;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let loaded = dotenv();
    init_tracing();
    match loaded {
        Ok(path) => info!("Loaded environment from {:?}", path),
        Err(e) => warn!("No .env file loaded ({}) - relying on environment", e),
    }

    let config = Config::from_env()?;
    info!(
        "Starting CineVault API (TMDB {}, OMDb {}, region {})",
        if config.tmdb_api_key.is_some() { "on" } else { "off" },
        if config.omdb_api_key.is_some() { "on" } else { "off" },
        config.watch_region
    );
    cinevault::app::run_server(config).await
}
