//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time only advances through `Simulator::step`
//! - Seeded RNG only
//! - Stable iteration order (grid cells row by row, obstacles by index)
//! - No rendering or platform dependencies

pub mod geometry;
pub mod grid;
pub mod level;
pub mod state;
pub mod tick;

pub use geometry::{Arena, GridPoint, MapPoint};
pub use grid::{CollisionGrid, Occupant};
pub use level::{Level, LevelSpec, generate_level};
pub use state::{
    Collision, Difficulty, GamePhase, GameState, Goal, Hover, MapObject, Obstacle, Player,
};
pub use tick::{SimConfig, Simulator, TickEvent};
