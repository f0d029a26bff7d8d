mod config;
mod web;

use anyhow::{Context, Result};
use leadminer_engine::ensure_output_dir;
use miner_logging::miner_info;

use crate::config::AppConfig;
use crate::web::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;

    if !miner_logging::initialize(
        config.log_destination,
        miner_logging::parse_level(&config.log_level),
        &config.log_file,
    ) {
        eprintln!("Warning: logger was not initialized");
    }

    ensure_output_dir(&config.output_dir)
        .with_context(|| format!("preparing output directory {}", config.output_dir.display()))?;

    let state = AppState::from_config(&config)?;

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    miner_info!(
        "LeadMiner listening on http://{} (reports in {})",
        config.bind,
        config.output_dir.display()
    );

    axum::serve(listener, web::router(state))
        .await
        .context("http server stopped")?;
    Ok(())
}
