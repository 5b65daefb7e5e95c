//! Game configuration, stored as TOML in the user's config directory.
//!
//! Every field has a default so partial or missing files still yield a playable
//! setup; only a file that fails to parse is reported as an error.

use color_eyre::eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn, Level};

const CONFIG_DIR: &str = "candyfall";
const CONFIG_FILE: &str = "config.toml";

/// How devices are attached to players for a session
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingDiscipline {
    /// Every capable device gets its own player; reconnects rebind by descriptor
    #[default]
    Multi,
    /// The most recently seen capable device is the only controller
    Single,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    /// Tick period in milliseconds (1000/31 ≈ 32)
    pub frame_interval_ms: u64,
    pub candy_pool_size: usize,
    /// Scale from axis value to pixels (and degrees) per tick
    pub move_ratio: f32,
    pub max_candy_velocity: i32,
    pub binding_discipline: BindingDiscipline,
    /// Capacity of the host command queue
    pub event_buffer: usize,
    /// Name of the one-shot cue played on a catch
    pub audio_cue: String,
    pub log_level: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 1000 / 31,
            candy_pool_size: 7,
            move_ratio: 10.0,
            max_candy_velocity: 15,
            binding_discipline: BindingDiscipline::Multi,
            event_buffer: 100,
            audio_cue: "ringabell".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl GameConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// Falls back to INFO for unknown level names
    pub fn tracing_level(&self) -> Level {
        Level::from_str(&self.log_level).unwrap_or_else(|_| {
            warn!("Unknown log level {:?}, using info", self.log_level);
            Level::INFO
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.frame_interval_ms == 0 {
            return Err(eyre!("frame_interval_ms must be greater than zero"));
        }
        if self.candy_pool_size == 0 {
            return Err(eyre!("candy_pool_size must be greater than zero"));
        }
        if self.max_candy_velocity < 2 {
            return Err(eyre!(
                "max_candy_velocity must be at least 2, got {}",
                self.max_candy_velocity
            ));
        }
        if self.event_buffer == 0 {
            return Err(eyre!("event_buffer must be greater than zero"));
        }
        Ok(())
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: GameConfig =
            toml::from_str(content).map_err(|e| eyre!("Failed to parse game config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// `<config dir>/candyfall/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        let mut path = dirs::config_dir().ok_or_else(|| eyre!("No config directory available"))?;
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        Ok(path)
    }

    /// Writes the default configuration if no file exists yet
    pub async fn ensure_default_config(path: &Path) -> Result<()> {
        if tokio::fs::try_exists(path)
            .await
            .map_err(|e| eyre!("Failed to check if config file exists: {}", e))?
        {
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| eyre!("Failed to create config directory: {}", e))?;
        }

        let content = toml::to_string_pretty(&GameConfig::default())
            .map_err(|e| eyre!("Failed to serialize default config: {}", e))?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| eyre!("Failed to write config file: {}", e))?;

        info!("Wrote default config to {}", path.display());
        Ok(())
    }

    pub async fn load(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path)
            .await
            .map_err(|e| eyre!("Failed to check if config file exists: {}", e))?
        {
            warn!("Config file {} does not exist, using defaults", path.display());
            return Ok(GameConfig::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("Failed to read config file: {}", e))?;
        Self::from_toml(&content)
    }
}
