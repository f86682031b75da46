//! Binary entry point: resolve settings, send logs to a file (the TUI owns
//! the terminal), open the catalog, and drive the Ratatui event loop until
//! the user exits.
use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use anyhow::Context;
use book_inventory::{run_app, App, AppConfig, Catalog};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    init_logging(&config)?;
    info!(data_dir = %config.data_dir.display(), "starting book inventory");

    let catalog = Catalog::open(&config.database_path).context("failed to open book catalog")?;
    let mut app = App::new(catalog, &config)?;
    run_app(&mut app)
}

/// `RUST_LOG` wins over the configured filter.
fn init_logging(config: &AppConfig) -> anyhow::Result<()> {
    fs::create_dir_all(&config.data_dir).context("failed to create data directory")?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
        .with_context(|| format!("failed to open log file {}", config.log_path.display()))?;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_filter)
            .with_context(|| format!("invalid log filter '{}'", config.log_filter))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}
