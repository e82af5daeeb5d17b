use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use garage_api::{config, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")))
        .init();

    let config = config::config();
    config.validate()?;
    if config.uses_default_secret() {
        tracing::warn!("JWT_SECRET is the development default; set it before deploying");
    }
    tracing::info!("Starting Garage API in {:?} mode", config.environment);

    let state = server::build_state(Arc::new(config.clone())).await?;
    server::serve(state).await
}
