//! tourbook server
//!
//! Usage: `tourbook [CONFIG_FILE]`. Without an argument the configuration is
//! read from `./config.toml`, `~/.config/tourbook/config.toml` and the
//! `TOURBOOK_` environment.

use anyhow::Context;
use tourbook::{config::Config, observability::init_tracing, routes, server::Server, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match std::env::args_os().nth(1) {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    init_tracing(&config).context("Failed to initialize tracing")?;

    let state = AppState::new(config.clone()).context("Failed to build application state")?;
    let seeded = state.seed().await.context("Failed to import seed data")?;
    if seeded > 0 {
        tracing::info!(tours = seeded, "Imported seed tours");
    }

    Server::new(config).serve(routes::router(state)).await?;

    Ok(())
}
