use std::error::Error;

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tree_config_engine::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load environment variables from .env file when one exists.
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            return Err(err.into());
        }
    }

    let settings = api::Settings::from_env()?;

    let engine_level = settings.debug.then_some(Level::DEBUG);
    tracing_subscriber::registry()
        .with(telemetry::env_filter("info", engine_level))
        .with(telemetry::layer())
        .try_init()?;

    tracing::info!(
        concat = settings.engine.concat,
        fallback = settings.engine.fallback,
        config = %settings.engine.default_config_name,
        "starting tree-config"
    );

    api::start(settings).await?;

    Ok(())
}
