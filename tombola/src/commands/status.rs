use anyhow::{Context, Result};
use std::path::Path;

use crate::config::{store_path_from_config, Config};
use crate::service;
use crate::store::EntryStore;

/// Show campaign status
pub fn run(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path).context("No config found. Run 'tombola init' first.")?;

    let store_path = store_path_from_config(config_path, &config);
    let store = EntryStore::open(&store_path)
        .map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))?;

    let status = service::status(&store)
        .map_err(|e| anyhow::anyhow!("Failed to read status: {}", e))?;
    let draw = service::winners(&store)
        .map_err(|e| anyhow::anyhow!("Failed to read draw record: {}", e))?;

    println!();
    println!("=== Tombola Status ===");
    println!();
    println!("Campaign:");
    println!(
        "  Ends: {}",
        status.end_time.as_deref().unwrap_or("(not set)")
    );
    println!();
    println!("Entries:");
    println!("  Count: {}", status.entry_count);
    println!("  Total tickets: {}", status.total_tickets);
    println!();
    println!("Last draw:");
    match draw {
        Some(record) => {
            println!("  At: {}", record.draw_time.to_rfc3339());
            println!("  Winners: {}", record.winners.len());
        }
        None => println!("  (no draw has been run yet)"),
    }
    println!();

    Ok(())
}
