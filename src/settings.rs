//! Game settings
//!
//! Every tunable of the tracker and the simulation, with the defaults the
//! game ships with. Stored as JSON: in LocalStorage in the browser, in a file
//! on native hosts.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::{Arena, SimConfig};
use crate::steering::TrackerConfig;

/// Failure to load, save or validate settings
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("settings I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Game settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Tracking ===
    /// How often the tracking loop grabs a frame (ms)
    pub poll_frequency_ms: u32,
    /// Sample every n-th pixel column and row
    pub sampling_stride: u32,
    /// Squared RGB distance accepted as skin at the image edges
    pub base_skin_threshold: f32,
    /// Skin pixels needed on each side of the image
    pub min_point_count: usize,
    /// Exponential smoothing weight of the newest angle
    pub smoothing_alpha: f32,
    /// Average the last n angles instead of exponential smoothing
    pub smoothing_window: Option<usize>,

    // === Map ===
    pub grid_width: u32,
    pub grid_height: u32,
    pub map_width: f32,
    pub map_height: f32,

    // === Player ===
    pub player_length: f32,
    pub player_width: f32,

    // === Levels ===
    pub initial_obstacle_count: u32,
    pub initial_floating_obstacle_count: u32,
    /// Shortest path (in cells) from the player to a freshly placed goal
    pub min_goal_distance: u32,
    /// Level RNG seed; unset means a fixed default
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_frequency_ms: POLL_FREQUENCY_MS,
            sampling_stride: SAMPLING_STRIDE,
            base_skin_threshold: BASE_SKIN_THRESHOLD,
            min_point_count: MIN_POINT_COUNT,
            smoothing_alpha: SMOOTHING_ALPHA,
            smoothing_window: None,

            grid_width: GRID_WIDTH,
            grid_height: GRID_HEIGHT,
            map_width: MAP_WIDTH,
            map_height: MAP_HEIGHT,

            player_length: PLAYER_LENGTH,
            player_width: PLAYER_WIDTH,

            initial_obstacle_count: INITIAL_STATIC_OBSTACLES,
            initial_floating_obstacle_count: INITIAL_FLOATING_OBSTACLES,
            min_goal_distance: MIN_GOAL_DISTANCE,
            seed: None,
        }
    }
}

impl Settings {
    /// Reject values the tracker or simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_frequency_ms == 0 {
            return Err(ConfigError::invalid("poll_frequency_ms", "must be positive"));
        }
        if self.sampling_stride == 0 {
            return Err(ConfigError::invalid("sampling_stride", "must be at least 1"));
        }
        if !(self.base_skin_threshold.is_finite() && self.base_skin_threshold >= 0.0) {
            return Err(ConfigError::invalid(
                "base_skin_threshold",
                format!("{} is not a non-negative number", self.base_skin_threshold),
            ));
        }
        if self.min_point_count == 0 {
            return Err(ConfigError::invalid("min_point_count", "must be at least 1"));
        }
        if !(self.smoothing_alpha > 0.0 && self.smoothing_alpha <= 1.0) {
            return Err(ConfigError::invalid(
                "smoothing_alpha",
                format!("{} is outside (0, 1]", self.smoothing_alpha),
            ));
        }
        if self.smoothing_window == Some(0) {
            return Err(ConfigError::invalid("smoothing_window", "must hold at least 1 angle"));
        }
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(ConfigError::invalid("grid_width", "grid dimensions must be positive"));
        }
        if (self.grid_width as usize) * (self.grid_height as usize) < MIN_GRID_CELLS {
            return Err(ConfigError::invalid(
                "grid_width",
                format!(
                    "{}x{} grid is too small, need at least {} cells",
                    self.grid_width, self.grid_height, MIN_GRID_CELLS
                ),
            ));
        }
        if !(self.map_width > 0.0 && self.map_height > 0.0) {
            return Err(ConfigError::invalid("map_width", "map dimensions must be positive"));
        }
        if self.grid_width as f32 > self.map_width || self.grid_height as f32 > self.map_height {
            return Err(ConfigError::invalid(
                "grid_width",
                "grid has more cells than the map has units",
            ));
        }
        if !(self.player_length > 0.0 && self.player_width > 0.0) {
            return Err(ConfigError::invalid("player_length", "player size must be positive"));
        }
        let cell = self.sim_config().arena.cell_size();
        if self.player_length > cell.min_element() {
            return Err(ConfigError::invalid(
                "player_length",
                format!(
                    "{} is longer than a {}x{} grid cell",
                    self.player_length, cell.x, cell.y
                ),
            ));
        }
        if self.initial_obstacle_count > MAX_STATIC_OBSTACLES {
            return Err(ConfigError::invalid(
                "initial_obstacle_count",
                format!("{} is above the cap of {}", self.initial_obstacle_count, MAX_STATIC_OBSTACLES),
            ));
        }
        if self.initial_floating_obstacle_count > MAX_FLOATING_OBSTACLES {
            return Err(ConfigError::invalid(
                "initial_floating_obstacle_count",
                format!(
                    "{} is above the cap of {}",
                    self.initial_floating_obstacle_count, MAX_FLOATING_OBSTACLES
                ),
            ));
        }
        let cells = self.grid_width as u64 * self.grid_height as u64;
        if u64::from(self.min_goal_distance) > cells {
            return Err(ConfigError::invalid(
                "min_goal_distance",
                format!("{} is longer than any path in a {}-cell grid", self.min_goal_distance, cells),
            ));
        }
        Ok(())
    }

    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            sampling_stride: self.sampling_stride,
            base_threshold: self.base_skin_threshold,
            min_point_count: self.min_point_count,
            smoothing_alpha: self.smoothing_alpha,
            smoothing_window: self.smoothing_window,
        }
    }

    pub fn sim_config(&self) -> SimConfig {
        SimConfig {
            arena: Arena {
                map_width: self.map_width,
                map_height: self.map_height,
                grid_width: self.grid_width,
                grid_height: self.grid_height,
            },
            player_length: self.player_length,
            player_width: self.player_width,
            initial_obstacle_count: self.initial_obstacle_count,
            initial_floating_obstacle_count: self.initial_floating_obstacle_count,
            min_goal_distance: self.min_goal_distance,
            seed: self.seed,
        }
    }

    /// Parse and validate settings JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read settings from a JSON file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    /// Write settings to a JSON file
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Settings saved to {}", path.as_ref().display());
        Ok(())
    }

    /// LocalStorage key
    const STORAGE_KEY: &'static str = "handtron_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native hosts use `load_from`
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        log::debug!("No {} store on this platform, using defaults", Self::STORAGE_KEY);
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
