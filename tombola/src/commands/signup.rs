use anyhow::{Context, Result};
use rand::rngs::OsRng;
use std::path::Path;

use crate::config::{store_path_from_config, Config};
use crate::service::{self, SignupRequest};
use crate::store::EntryStore;

/// Register a new raffle entry
pub fn run(
    config_path: &Path,
    phone: &str,
    instagram: &str,
    name: Option<&str>,
    referred_by: Option<&str>,
) -> Result<()> {
    let config = Config::load(config_path).context("No config found. Run 'tombola init' first.")?;

    let store_path = store_path_from_config(config_path, &config);
    let store = EntryStore::open(&store_path)
        .map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))?;

    let request = SignupRequest {
        name: name.unwrap_or_default().to_string(),
        phone: phone.to_string(),
        instagram: instagram.to_string(),
        referred_by: referred_by.map(str::to_string),
    };

    let response = service::signup(&store, &mut OsRng, request)
        .map_err(|e| anyhow::anyhow!("Signup failed: {}", e))?;

    println!("Entry registered");
    println!("  Referral code: {}", response.referral_code);
    println!();
    println!("Share the code to earn bonus tickets for this entry.");

    Ok(())
}
