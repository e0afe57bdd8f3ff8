mod utils;

pub mod arbiter;
pub mod console;
pub mod devices;
pub mod feedback;
pub mod gesture;
pub mod mailbox;
pub mod quiz;
pub mod scoring;
pub mod settings;
pub mod voice;

use anyhow::{Context, Result};

use settings::{QuizConfig, SettingsStore};

pub fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("MultiTrivia starting up...");

    let settings = SettingsStore::new(SettingsStore::default_path())
        .context("failed to load settings")?;
    let config = QuizConfig::from_env();

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    runtime.block_on(console::run(settings, config))
}
