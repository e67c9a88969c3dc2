//! # Configuration
//!
//! TOML configuration for the `mazemap` CLI. Every section is optional; missing values
//! fall back to [`Config::default`].
//!
//! ```toml
//! [storage]
//! data_dir = "./data"
//!
//! [player]
//! name = "player"
//!
//! [logging]
//! level = "info"
//! file = "mazemap.log"
//! ```
//!
//! Snapshots are written to `<data_dir>/maps/<player>.json`. CLI flags take precedence
//! over the file: `--player` > `[player] name` > default.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::map::MapStore;
use crate::validation::validate_player_name;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            data_dir: "./data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Selects the per-player snapshot file.
    pub name: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            name: "player".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Parsed level; unknown strings fall back to `Info`.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        validate_player_name(&config.player.name)
            .map_err(|e| anyhow!("Invalid [player] name in {}: {}", path, e))?;

        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Snapshot store for `player`, or the configured player when `None`.
    pub fn map_store(&self, player: Option<&str>) -> Result<MapStore> {
        let name = player.unwrap_or(self.player.name.as_str());
        validate_player_name(name).map_err(|e| anyhow!("Invalid player name: {}", e))?;
        Ok(MapStore::new(&self.storage.data_dir, name))
    }
}
