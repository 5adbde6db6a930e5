//! Handtron - a light-cycle obstacle game steered with your hands
//!
//! Core modules:
//! - `steering`: Webcam hand tracking (skin segmentation, dual centroids, smoothing)
//! - `sim`: Deterministic simulation (motion, collision grid, level generation)
//! - `settings`: Tunable configuration shared by both

pub mod settings;
pub mod sim;
pub mod steering;

pub use settings::{ConfigError, Settings};

/// Game configuration constants
pub mod consts {
    use crate::degrees_to_radians;

    /// Length of one logical time step (ms). Rates below are quoted per step.
    pub const TIMESTEP_MS: f32 = 30.0;

    /// Map dimensions (map units)
    pub const MAP_WIDTH: f32 = 1000.0;
    pub const MAP_HEIGHT: f32 = 1000.0;
    /// Collision grid dimensions (cells)
    pub const GRID_WIDTH: u32 = 20;
    pub const GRID_HEIGHT: u32 = 20;
    /// How far past the map edge a point may stray before it counts as out of bounds
    pub const BOUND_MARGIN: f32 = 3.0;

    /// Player hit-box triangle
    pub const PLAYER_LENGTH: f32 = 21.0;
    pub const PLAYER_WIDTH: f32 = 12.0;
    /// Spawn point and (unnormalized) heading
    pub const SPAWN_POS: (f32, f32) = (50.0, 50.0);
    pub const SPAWN_DIR: (f32, f32) = (3.0, 5.0);

    /// Forward speed (map units per ms)
    pub const SPEED: f32 = 1.6 / TIMESTEP_MS;
    pub const SPEED_SCALE_PER_LEVEL: f32 = 1.15;
    pub const SPEED_LIMIT: f32 = 3.0 / TIMESTEP_MS;

    /// Turn rate (radians per ms)
    pub const DELTA_THETA: f32 = degrees_to_radians(0.5) / TIMESTEP_MS;
    /// Heading changes smaller than this are ignored
    pub const TURN_TOLERANCE: f32 = DELTA_THETA / 2.0;
    /// Largest per-tick heading offset a full steering input asks for
    pub const MAX_THETA: f32 = degrees_to_radians(3.0);
    pub const MAX_THETA_SCALE_PER_LEVEL: f32 = 1.1;
    pub const MAX_THETA_LIMIT: f32 = degrees_to_radians(10.0);

    /// Obstacle counts
    pub const INITIAL_STATIC_OBSTACLES: u32 = 10;
    pub const INITIAL_FLOATING_OBSTACLES: u32 = 10;
    pub const OBSTACLES_PER_LEVEL: u32 = 10;
    pub const MAX_STATIC_OBSTACLES: u32 = 45;
    pub const MAX_FLOATING_OBSTACLES: u32 = 85;

    /// Floating obstacles bob between 0 and this height
    pub const FLOATING_OBSTACLE_MAX_HEIGHT: f32 = 100.0;
    pub const FLOATING_OBSTACLE_SPEED: f32 = 1.2 / TIMESTEP_MS;
    /// A floating obstacle only hits the player while below this height
    pub const FLOATING_OBSTACLE_COLLISION_THRESHOLD: f32 = 12.0;

    /// Goal placement
    pub const MIN_GOAL_DISTANCE: u32 = 25;
    pub const GOAL_RETRY_DEPTH: u32 = 5;
    /// Spawn block (3x3) plus one goal cell
    pub const MIN_GRID_CELLS: usize = 10;

    /// Scoring
    pub const GOAL_BONUS: f64 = 100.0;
    pub const OBSTACLE_PENALTY: f64 = 25.0;
    /// Out-of-bounds penalty is dt / this, per hit-box point
    pub const OUT_OF_BOUNDS_PENALTY_DIVISOR: f64 = 500.0;

    /// Hand tracker defaults
    pub const POLL_FREQUENCY_MS: u32 = 100;
    pub const SAMPLING_STRIDE: u32 = 2;
    pub const BASE_SKIN_THRESHOLD: f32 = 1500.0;
    pub const MIN_POINT_COUNT: usize = 10;
    pub const SMOOTHING_ALPHA: f32 = 0.75;
    pub const SMOOTHING_WINDOW: usize = 5;

    /// Seed used when the settings don't pin one
    pub const DEFAULT_SEED: u64 = 0x7472_6f6e;
}

/// Convert degrees to radians
#[inline]
pub const fn degrees_to_radians(deg: f32) -> f32 {
    deg * std::f32::consts::PI / 180.0
}

/// True if `(x, y)` lies in `[-margin, width + margin) x [-margin, height + margin)`
#[inline]
pub fn is_in_bound(x: f32, y: f32, width: f32, height: f32, margin: f32) -> bool {
    -margin <= x && x < width + margin && -margin <= y && y < height + margin
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degrees_to_radians() {
        assert!((degrees_to_radians(180.0) - std::f32::consts::PI).abs() < 1e-6);
        assert_eq!(degrees_to_radians(0.0), 0.0);
    }

    #[test]
    fn test_is_in_bound_margin() {
        assert!(is_in_bound(-3.0, 0.0, 10.0, 10.0, 3.0));
        assert!(!is_in_bound(-3.1, 0.0, 10.0, 10.0, 3.0));
        assert!(is_in_bound(12.9, 9.0, 10.0, 10.0, 3.0));
        assert!(!is_in_bound(13.0, 9.0, 10.0, 10.0, 3.0));
        assert!(!is_in_bound(10.0, 0.0, 10.0, 10.0, 0.0));
    }
}
