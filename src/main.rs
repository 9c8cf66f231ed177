use anyhow::Result;
use pantry_vision::{config, server};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Validates that a log level string is valid
fn validate_log_level(level: &str) -> Result<()> {
    level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .map_err(|_| {
            anyhow::anyhow!(
                "Invalid log level: '{}'. Valid levels: error, warn, info, debug, trace",
                level
            )
        })?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (before logging setup)
    let config = match config::load().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = validate_log_level(&config.server.logs.level) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    // RUST_LOG overrides the configured level
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.server.logs.level)?,
    };

    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    info!(
        "Starting pantry-vision with model {}",
        config.model.path.display()
    );

    server::run(config).await?;

    Ok(())
}
