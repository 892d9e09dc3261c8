mod replay;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::io::{stdin, BufReader};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use extrafiles_core::{load_config, validate_config, ExtraFiles};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Logs go to stderr, the report to stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = std::env::var("EXTRAFILES_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("extrafiles.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;
    info!(
        "Configuration loaded: {} pattern categories, {} path formats",
        config.patterns.len(),
        config.paths.len()
    );

    let extrafiles = ExtraFiles::new(&config).context("Failed to set up extra files")?;
    let report = replay::replay(BufReader::new(stdin()), extrafiles).await?;

    let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
    println!("{}", json);

    Ok(())
}
