use anyhow::Result;
use std::path::Path;

use crate::config::{store_path_from_config, Config};
use crate::store::EntryStore;

/// Create the config file and an empty store
pub fn run(config_path: &Path) -> Result<()> {
    if Config::exists(config_path) {
        println!("Config already exists at {}", config_path.display());
        return Ok(());
    }

    let config = Config::default();
    config.save(config_path)?;

    // Opening seeds the default campaign end time
    let store_path = store_path_from_config(config_path, &config);
    let store = EntryStore::open(&store_path)
        .map_err(|e| anyhow::anyhow!("Failed to create store: {}", e))?;
    let end_time = store.end_time()?.unwrap_or_default();

    println!("Initialized raffle campaign");
    println!("  Config: {}", config_path.display());
    println!("  Store: {}", store_path.display());
    println!("  Campaign ends: {}", end_time);
    println!();
    println!("Adjust the end time with 'tombola set-end <TIMESTAMP>'.");

    Ok(())
}
