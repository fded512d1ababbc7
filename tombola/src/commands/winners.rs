use anyhow::{Context, Result};
use std::path::Path;

use crate::config::{store_path_from_config, Config};
use crate::service;
use crate::store::EntryStore;

/// Show the winners of the last drawing
pub fn run(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path).context("No config found. Run 'tombola init' first.")?;

    let store_path = store_path_from_config(config_path, &config);
    let store = EntryStore::open(&store_path)
        .map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))?;

    match service::winners(&store).map_err(|e| anyhow::anyhow!("Failed to read winners: {}", e))? {
        Some(record) => {
            println!("Draw at {}:", record.draw_time.to_rfc3339());
            if record.winners.is_empty() {
                println!("  (the drawing had no entries)");
            }
            for winner in &record.winners {
                println!(
                    "  #{} {} (phone {}, instagram {}, {} tickets)",
                    winner.id,
                    if winner.name.is_empty() {
                        "(no name)"
                    } else {
                        winner.name.as_str()
                    },
                    winner.phone,
                    winner.instagram,
                    winner.tickets,
                );
            }
        }
        None => println!("No draw has been run yet."),
    }

    Ok(())
}
