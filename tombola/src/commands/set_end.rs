use anyhow::{Context, Result};
use std::path::Path;

use crate::config::{store_path_from_config, Config};
use crate::service;
use crate::store::EntryStore;

/// Set the campaign end time shown to entrants
pub fn run(config_path: &Path, end_time: &str) -> Result<()> {
    let config = Config::load(config_path).context("No config found. Run 'tombola init' first.")?;

    let store_path = store_path_from_config(config_path, &config);
    let store = EntryStore::open(&store_path)
        .map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))?;

    service::set_end_time(&store, end_time)
        .map_err(|e| anyhow::anyhow!("Failed to set end time: {}", e))?;

    println!("Campaign end time set to {}", end_time);

    Ok(())
}
