//! Binary entry point: resolve the application folders, start file logging,
//! load templates, and drive the Ratatui event loop until the user exits.
use anyhow::Context;
use callsheet_maker::pdf::{discover_templates, seed_templates};
use callsheet_maker::{logging, run_app, App, AppConfig, CallSheetStore};
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    config.ensure_dirs()?;
    logging::init(&config.log_file)?;
    info!(root = %config.root.display(), "starting call sheet maker");

    let store = CallSheetStore::open(&config.data_dir).context("failed to open data folder")?;
    seed_templates(&config.templates_dir).context("failed to seed templates")?;
    let templates = discover_templates(&config.templates_dir);

    let mut app = App::new(config, store, templates)?;
    let result = run_app(&mut app);
    if let Err(err) = &result {
        error!(error = %format!("{err:#}"), "application exited with an error");
    }
    result
}
