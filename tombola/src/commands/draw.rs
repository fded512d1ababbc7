use anyhow::{Context, Result};
use rand::rngs::OsRng;
use std::path::Path;

use crate::config::{store_path_from_config, Config};
use crate::service;
use crate::store::EntryStore;

/// Run a drawing and persist the winners
pub fn run(config_path: &Path, winners: Option<usize>) -> Result<()> {
    let config = Config::load(config_path).context("No config found. Run 'tombola init' first.")?;

    let store_path = store_path_from_config(config_path, &config);
    let store = EntryStore::open(&store_path)
        .map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))?;

    let k = winners.unwrap_or(config.draw.winners_per_draw);
    let outcome = service::run_draw(&store, &mut OsRng, k)
        .map_err(|e| anyhow::anyhow!("Draw failed: {}", e))?;

    if outcome.winners.is_empty() {
        println!("No entries to draw from.");
        return Ok(());
    }

    println!("Drew {} winner(s):", outcome.winners.len());
    for winner in &outcome.winners {
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

    Ok(())
}
