use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub border: BorderConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub food: FoodConfig,
    #[serde(default)]
    pub virus: VirusConfig,
    #[serde(default)]
    pub eject: EjectConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_name")]
    pub name: String,
    /// Gamemode id, resolved through `gamemodes::get_gamemode`.
    #[serde(default)]
    pub gamemode: u32,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Base half-extent of a player's view box before scale is applied.
    #[serde(default = "default_view_base")]
    pub view_base: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BorderConfig {
    #[serde(default)]
    pub left: f32,
    #[serde(default)]
    pub top: f32,
    #[serde(default = "default_border_extent")]
    pub right: f32,
    #[serde(default = "default_border_extent")]
    pub bottom: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "default_player_start_mass")]
    pub start_mass: f32,
    #[serde(default = "default_player_max_mass")]
    pub max_mass: f32,
    #[serde(default = "default_player_min_mass_eject")]
    pub min_mass_eject: f32,
    #[serde(default = "default_player_min_mass_split")]
    pub min_mass_split: f32,
    #[serde(default = "default_player_max_cells")]
    pub max_cells: usize,
    /// Base merge countdown in seconds.
    #[serde(default = "default_player_recombine_time")]
    pub recombine_time: i32,
    #[serde(default = "default_player_mass_decay_rate")]
    pub mass_decay_rate: f32,
    #[serde(default = "default_player_min_mass_decay")]
    pub min_mass_decay: f32,
    /// Seconds a disconnected player's cells linger before removal.
    #[serde(default = "default_player_disconnect_time")]
    pub disconnect_time: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FoodConfig {
    #[serde(default = "default_food_mass")]
    pub mass: f32,
    #[serde(default = "default_food_start_amount")]
    pub start_amount: usize,
    #[serde(default = "default_food_max_amount")]
    pub max_amount: usize,
    #[serde(default = "default_food_spawn_amount")]
    pub spawn_amount: usize,
    /// Ticks between spawn passes.
    #[serde(default = "default_food_spawn_interval")]
    pub spawn_interval: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VirusConfig {
    #[serde(default = "default_virus_start_mass")]
    pub start_mass: f32,
    #[serde(default = "default_virus_min_amount")]
    pub min_amount: usize,
    #[serde(default = "default_virus_max_amount")]
    pub max_amount: usize,
    /// Ejected-mass feedings before a fed virus shoots a new one.
    #[serde(default = "default_virus_feed_amount")]
    pub feed_amount: u32,
    #[serde(default = "default_virus_shot_speed")]
    pub shot_speed: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EjectConfig {
    /// Mass of the spawned blob.
    #[serde(default = "default_eject_mass")]
    pub mass: f32,
    /// Mass the ejecting cell actually loses.
    #[serde(default = "default_eject_mass_loss")]
    pub mass_loss: f32,
    #[serde(default = "default_eject_speed")]
    pub speed: f32,
}

fn default_server_name() -> String {
    "petri".to_string()
}
fn default_tick_interval_ms() -> u64 {
    50
}
fn default_view_base() -> f32 {
    1024.0
}
fn default_border_extent() -> f32 {
    6000.0
}
fn default_player_start_mass() -> f32 {
    10.0
}
fn default_player_max_mass() -> f32 {
    22500.0
}
fn default_player_min_mass_eject() -> f32 {
    32.0
}
fn default_player_min_mass_split() -> f32 {
    36.0
}
fn default_player_max_cells() -> usize {
    16
}
fn default_player_recombine_time() -> i32 {
    30
}
fn default_player_mass_decay_rate() -> f32 {
    0.002
}
fn default_player_min_mass_decay() -> f32 {
    9.0
}
fn default_player_disconnect_time() -> i32 {
    60
}
fn default_food_mass() -> f32 {
    1.0
}
fn default_food_start_amount() -> usize {
    100
}
fn default_food_max_amount() -> usize {
    500
}
fn default_food_spawn_amount() -> usize {
    10
}
fn default_food_spawn_interval() -> u32 {
    20
}
fn default_virus_start_mass() -> f32 {
    100.0
}
fn default_virus_min_amount() -> usize {
    10
}
fn default_virus_max_amount() -> usize {
    50
}
fn default_virus_feed_amount() -> u32 {
    7
}
fn default_virus_shot_speed() -> f32 {
    200.0
}
fn default_eject_mass() -> f32 {
    12.0
}
fn default_eject_mass_loss() -> f32 {
    16.0
}
fn default_eject_speed() -> f32 {
    160.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            border: BorderConfig::default(),
            player: PlayerConfig::default(),
            food: FoodConfig::default(),
            virus: VirusConfig::default(),
            eject: EjectConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            gamemode: 0,
            tick_interval_ms: default_tick_interval_ms(),
            view_base: default_view_base(),
        }
    }
}

impl Default for BorderConfig {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            right: default_border_extent(),
            bottom: default_border_extent(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            start_mass: default_player_start_mass(),
            max_mass: default_player_max_mass(),
            min_mass_eject: default_player_min_mass_eject(),
            min_mass_split: default_player_min_mass_split(),
            max_cells: default_player_max_cells(),
            recombine_time: default_player_recombine_time(),
            mass_decay_rate: default_player_mass_decay_rate(),
            min_mass_decay: default_player_min_mass_decay(),
            disconnect_time: default_player_disconnect_time(),
        }
    }
}

impl Default for FoodConfig {
    fn default() -> Self {
        Self {
            mass: default_food_mass(),
            start_amount: default_food_start_amount(),
            max_amount: default_food_max_amount(),
            spawn_amount: default_food_spawn_amount(),
            spawn_interval: default_food_spawn_interval(),
        }
    }
}

impl Default for VirusConfig {
    fn default() -> Self {
        Self {
            start_mass: default_virus_start_mass(),
            min_amount: default_virus_min_amount(),
            max_amount: default_virus_max_amount(),
            feed_amount: default_virus_feed_amount(),
            shot_speed: default_virus_shot_speed(),
        }
    }
}

impl Default for EjectConfig {
    fn default() -> Self {
        Self {
            mass: default_eject_mass(),
            mass_loss: default_eject_mass_loss(),
            speed: default_eject_speed(),
        }
    }
}

impl Config {
    fn read_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Loads the config file, falling back to built-in defaults on any
    /// failure. A broken config must not prevent the server from starting.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            warn!(path = %path.display(), "config file not found, using defaults");
            return Self::default();
        }
        match Self::read_from(path) {
            Ok(config) => config,
            Err(err) => {
                warn!(%err, "failed to load config, using defaults");
                Self::default()
            }
        }
    }
}
