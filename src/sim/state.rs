//! Game state and core simulation types
//!
//! Everything the render sink needs to draw a frame lives here.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::geometry::{GridPoint, MapPoint};
use super::grid::{CollisionGrid, Occupant};
use crate::consts::*;

/// Coarse game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Generating obstacles and goal
    Initializing,
    /// Active gameplay
    Running,
    /// Goal touched; waiting for the host to start the next level
    GoalReached,
    /// Obstacle touched; waiting for the host to restart
    GameOver,
}

/// The player's light-cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Nose position (map space)
    pub pos: MapPoint,
    /// Heading change applied each tick (radians)
    pub cur_theta: f32,
    /// Latest steering input in [-1, 1]
    pub normalized_theta: f32,
    /// Unit facing direction in the map plane (z = 0)
    pub dir: Vec3,
}

impl Default for Player {
    fn default() -> Self {
        Self::spawn()
    }
}

impl Player {
    pub fn new(pos: MapPoint, dir: Vec3) -> Self {
        Self {
            pos,
            cur_theta: 0.0,
            normalized_theta: 0.0,
            dir: Vec3::new(dir.x, dir.y, 0.0).normalize_or(Vec3::X),
        }
    }

    /// Fixed spawn point and heading used for new games
    pub fn spawn() -> Self {
        Self::new(
            MapPoint::new(SPAWN_POS.0, SPAWN_POS.1),
            Vec3::new(SPAWN_DIR.0, SPAWN_DIR.1, 0.0),
        )
    }

    /// Move `cur_theta` toward `normalized_theta * max_theta`, changing it by
    /// at most `DELTA_THETA * dt`. Differences within the tolerance are ignored.
    pub fn ease_heading(&mut self, dt: f32, max_theta: f32) {
        let intended = self.normalized_theta * max_theta;
        let delta = intended - self.cur_theta;
        if delta.abs() > TURN_TOLERANCE {
            self.cur_theta += delta.signum() * delta.abs().min(DELTA_THETA * dt);
        }
    }

    /// Turn the facing direction by `cur_theta` about the vertical axis
    pub fn rotate_heading(&mut self) {
        self.dir = (Quat::from_rotation_z(self.cur_theta) * self.dir).normalize_or(self.dir);
    }

    /// Position after travelling `distance` along the facing direction
    pub fn ahead(&self, distance: f32) -> MapPoint {
        MapPoint::new(
            self.pos.x + distance * self.dir.x,
            self.pos.y + distance * self.dir.y,
        )
    }

    /// Triangle footprint: nose, then the two rear corners
    pub fn hit_box(&self, length: f32, width: f32) -> [MapPoint; 3] {
        let back = -self.dir * length;
        let side = back.cross(Vec3::Z).normalize_or_zero() * (0.5 * width);
        let base = Vec3::new(self.pos.x, self.pos.y, 0.0) + back;
        [
            self.pos,
            MapPoint::new(base.x + side.x, base.y + side.y),
            MapPoint::new(base.x - side.x, base.y - side.y),
        ]
    }
}

/// Vertical bobbing of a floating obstacle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hover {
    pub z: f32,
    pub rising: bool,
}

impl Hover {
    /// Move by `FLOATING_OBSTACLE_SPEED * dt`, bouncing between 0 and the max height
    pub fn advance(&mut self, dt: f32) {
        let step = FLOATING_OBSTACLE_SPEED * dt;
        self.z += if self.rising { step } else { -step };
        if self.z > FLOATING_OBSTACLE_MAX_HEIGHT {
            self.z = FLOATING_OBSTACLE_MAX_HEIGHT;
            self.rising = false;
        } else if self.z < 0.0 {
            self.z = 0.0;
            self.rising = true;
        }
    }
}

/// An obstacle anchored to a grid cell; `hover` makes it a floating one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub cell: GridPoint,
    pub pos: MapPoint,
    pub hover: Option<Hover>,
}

impl Obstacle {
    /// Floating obstacles can be passed under while high enough
    pub fn can_collide(&self, _player: &Player) -> bool {
        match self.hover {
            Some(hover) => hover.z < FLOATING_OBSTACLE_COLLISION_THRESHOLD,
            None => true,
        }
    }
}

/// The level's goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub cell: GridPoint,
    pub pos: MapPoint,
}

/// Outcome of touching a map object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
    GameOver,
    GoalReached,
}

/// Borrowed view of whatever occupies a grid cell
#[derive(Debug, Clone, Copy)]
pub enum MapObject<'a> {
    Obstacle(&'a Obstacle),
    Goal(&'a Goal),
}

impl MapObject<'_> {
    pub fn pos(&self) -> MapPoint {
        match self {
            MapObject::Obstacle(o) => o.pos,
            MapObject::Goal(g) => g.pos,
        }
    }

    /// Whether the player hits this object right now
    pub fn can_collide(&self, player: &Player) -> bool {
        match self {
            MapObject::Obstacle(o) => o.can_collide(player),
            MapObject::Goal(_) => true,
        }
    }

    /// What touching this object does
    pub fn handle_collision(&self) -> Collision {
        match self {
            MapObject::Obstacle(_) => Collision::GameOver,
            MapObject::Goal(_) => Collision::GoalReached,
        }
    }
}

/// Per-level tuning that ramps up as levels are cleared
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Difficulty {
    /// Map units per ms
    pub speed: f32,
    /// Largest heading offset per tick (radians)
    pub max_theta: f32,
    pub static_obstacles: u32,
    pub floating_obstacles: u32,
}

impl Difficulty {
    pub fn initial(static_obstacles: u32, floating_obstacles: u32) -> Self {
        Self {
            speed: SPEED,
            max_theta: MAX_THETA,
            static_obstacles,
            floating_obstacles,
        }
    }

    /// Tuning for the level after this one
    pub fn next_level(&self) -> Self {
        Self {
            speed: (self.speed * SPEED_SCALE_PER_LEVEL).min(SPEED_LIMIT),
            max_theta: (self.max_theta * MAX_THETA_SCALE_PER_LEVEL).min(MAX_THETA_LIMIT),
            static_obstacles: self.static_obstacles.saturating_add(OBSTACLES_PER_LEVEL)
                .min(MAX_STATIC_OBSTACLES),
            floating_obstacles: self.floating_obstacles.saturating_add(OBSTACLES_PER_LEVEL)
                .min(MAX_FLOATING_OBSTACLES),
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::initial(INITIAL_STATIC_OBSTACLES, INITIAL_FLOATING_OBSTACLES)
    }
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub player: Player,
    /// Static and floating obstacles (grid occupants index into this)
    pub obstacles: Vec<Obstacle>,
    pub goal: Option<Goal>,
    pub grid: CollisionGrid,
    /// Never negative; fractional because of the out-of-bounds drain
    pub score: f64,
    /// Starts at 1
    pub level: u32,
    pub paused: bool,
    pub phase: GamePhase,
    pub difficulty: Difficulty,
    /// Simulated time since the current level started (ms)
    pub level_time_ms: f64,
}

impl GameState {
    /// Fresh state for a new game, paused until a level is generated
    pub fn new(grid_width: u32, grid_height: u32, difficulty: Difficulty) -> Self {
        Self {
            player: Player::spawn(),
            obstacles: Vec::new(),
            goal: None,
            grid: CollisionGrid::new(grid_width, grid_height),
            score: 0.0,
            level: 1,
            paused: true,
            phase: GamePhase::Initializing,
            difficulty,
            level_time_ms: 0.0,
        }
    }

    /// Object occupying a cell, if any
    pub fn object_at(&self, cell: GridPoint) -> Option<MapObject<'_>> {
        match self.grid.get(cell)? {
            Occupant::Obstacle(i) => self.obstacles.get(i).map(MapObject::Obstacle),
            Occupant::Goal => self.goal.as_ref().map(MapObject::Goal),
        }
    }

    /// Add (or subtract) points, flooring the score at zero
    pub fn add_score(&mut self, delta: f64) {
        self.score = (self.score + delta).max(0.0);
    }

    /// Score as shown in the HUD
    pub fn display_score(&self) -> u64 {
        self.score.round() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_spawn_heading_normalized() {
        let p = Player::spawn();
        assert!((p.dir.length() - 1.0).abs() < 1e-6);
        assert_eq!(p.dir.z, 0.0);
        let expected = Vec2::new(3.0, 5.0).normalize();
        assert!((p.dir.x - expected.x).abs() < 1e-6);
    }

    #[test]
    fn test_ease_heading_clamps_rate() {
        let mut p = Player::spawn();
        p.normalized_theta = 1.0;
        p.ease_heading(30.0, MAX_THETA);
        assert!((p.cur_theta - DELTA_THETA * 30.0).abs() < 1e-7);

        // Enough time to reach the target exactly
        p.ease_heading(10_000.0, MAX_THETA);
        assert!((p.cur_theta - MAX_THETA).abs() < 1e-7);
    }

    #[test]
    fn test_ease_heading_ignores_jitter() {
        let mut p = Player::spawn();
        p.normalized_theta = TURN_TOLERANCE * 0.5 / MAX_THETA;
        p.ease_heading(30.0, MAX_THETA);
        assert_eq!(p.cur_theta, 0.0);
    }

    #[test]
    fn test_hit_box_facing_east() {
        let p = Player::new(MapPoint::new(100.0, 100.0), Vec3::X);
        let [nose, a, b] = p.hit_box(21.0, 12.0);
        assert_eq!(nose, MapPoint::new(100.0, 100.0));
        // (-21, 0, 0) x (0, 0, 1) = (0, 21, 0) -> +y side first
        assert!((a.x - 79.0).abs() < 1e-4 && (a.y - 106.0).abs() < 1e-4);
        assert!((b.x - 79.0).abs() < 1e-4 && (b.y - 94.0).abs() < 1e-4);
    }

    #[test]
    fn test_rotate_heading_quarter_turn() {
        let mut p = Player::new(MapPoint::new(0.0, 0.0), Vec3::X);
        p.cur_theta = std::f32::consts::FRAC_PI_2;
        p.rotate_heading();
        assert!(p.dir.x.abs() < 1e-6 && (p.dir.y - 1.0).abs() < 1e-6);
        let ahead = p.ahead(10.0);
        assert!((ahead.y - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_hover_bounces() {
        let mut h = Hover { z: 99.0, rising: true };
        h.advance(100.0);
        assert_eq!(h.z, FLOATING_OBSTACLE_MAX_HEIGHT);
        assert!(!h.rising);

        let mut h = Hover { z: 1.0, rising: false };
        h.advance(100.0);
        assert_eq!(h.z, 0.0);
        assert!(h.rising);
    }

    #[test]
    fn test_floating_obstacle_collides_only_low() {
        let player = Player::spawn();
        let mut o = Obstacle {
            cell: GridPoint::new(3, 3),
            pos: MapPoint::new(150.0, 150.0),
            hover: Some(Hover { z: 50.0, rising: true }),
        };
        assert!(!MapObject::Obstacle(&o).can_collide(&player));
        o.hover = Some(Hover { z: 11.9, rising: true });
        assert!(MapObject::Obstacle(&o).can_collide(&player));
        o.hover = None;
        assert!(MapObject::Obstacle(&o).can_collide(&player));
        assert_eq!(MapObject::Obstacle(&o).handle_collision(), Collision::GameOver);
    }

    #[test]
    fn test_difficulty_caps() {
        let mut d = Difficulty::default();
        for _ in 0..30 {
            d = d.next_level();
        }
        assert_eq!(d.speed, SPEED_LIMIT);
        assert_eq!(d.max_theta, MAX_THETA_LIMIT);
        assert_eq!(d.static_obstacles, MAX_STATIC_OBSTACLES);
        assert_eq!(d.floating_obstacles, MAX_FLOATING_OBSTACLES);
    }

    #[test]
    fn test_next_level_saturates_huge_counts() {
        let d = Difficulty::initial(u32::MAX, u32::MAX - 1).next_level();
        assert_eq!(d.static_obstacles, MAX_STATIC_OBSTACLES);
        assert_eq!(d.floating_obstacles, MAX_FLOATING_OBSTACLES);
    }

    #[test]
    fn test_score_floors_at_zero() {
        let mut s = GameState::new(20, 20, Difficulty::default());
        s.add_score(10.0);
        s.add_score(-25.0);
        assert_eq!(s.score, 0.0);
        s.add_score(100.4);
        assert_eq!(s.display_score(), 100);
    }
}
