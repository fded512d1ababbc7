use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration for Tombola
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Where the raffle database lives (default: next to the config file)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    #[serde(default)]
    pub draw: DrawConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawConfig {
    /// Number of winners selected per drawing
    #[serde(default = "default_winners_per_draw")]
    pub winners_per_draw: usize,
}

fn default_winners_per_draw() -> usize {
    tombola_draw::DEFAULT_WINNERS
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            winners_per_draw: default_winners_per_draw(),
        }
    }
}

impl Config {
    /// Load config from a file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Save config to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// Check if config file exists
    pub fn exists(path: &Path) -> bool {
        path.exists()
    }
}

/// Get the default data directory path
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .expect("Could not determine home directory")
        .join(".tombola")
}

/// Get the default config file path
pub fn default_config_path() -> PathBuf {
    default_data_dir().join("config.toml")
}

/// Get the store directory for a given config file location, honoring a
/// `data_dir` override.
pub fn store_path_from_config(config_path: &Path, config: &Config) -> PathBuf {
    match &config.data_dir {
        Some(dir) => dir.clone(),
        None => config_path.parent().unwrap_or(config_path).join("store"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config {
            data_dir: Some(PathBuf::from("/var/lib/tombola")),
            draw: DrawConfig {
                winners_per_draw: 5,
            },
        };
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.data_dir.as_deref(), Some(Path::new("/var/lib/tombola")));
        assert_eq!(loaded.draw.winners_per_draw, 5);
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert!(config.data_dir.is_none());
        assert_eq!(config.draw.winners_per_draw, tombola_draw::DEFAULT_WINNERS);
    }

    #[test]
    fn test_empty_file_parses_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "").unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.draw.winners_per_draw, tombola_draw::DEFAULT_WINNERS);
    }

    #[test]
    fn test_store_path_honors_data_dir() {
        let config_path = Path::new("/home/user/.tombola/config.toml");

        let default_config = Config::default();
        assert_eq!(
            store_path_from_config(config_path, &default_config),
            Path::new("/home/user/.tombola/store")
        );

        let overridden = Config {
            data_dir: Some(PathBuf::from("/srv/raffle")),
            ..Default::default()
        };
        assert_eq!(
            store_path_from_config(config_path, &overridden),
            Path::new("/srv/raffle")
        );
    }
}
