//! Simulation step
//!
//! `Simulator` owns the game state and the level RNG. The host calls `step`
//! once per frame (or per fixed timestep) with the elapsed time and the latest
//! steering value, then calls `advance` when it is ready to leave a
//! `GoalReached` or `GameOver` pause.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::geometry::{Arena, GridPoint, MapPoint};
use super::grid::{CollisionGrid, Occupant};
use super::level::{LevelSpec, generate_level};
use super::state::{Collision, Difficulty, GamePhase, GameState, Goal, Obstacle, Player};
use crate::consts::*;

/// Simulation parameters fixed for a whole run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub arena: Arena,
    pub player_length: f32,
    pub player_width: f32,
    pub initial_obstacle_count: u32,
    pub initial_floating_obstacle_count: u32,
    pub min_goal_distance: u32,
    /// Level RNG seed; `None` uses `DEFAULT_SEED`
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            arena: Arena::default(),
            player_length: PLAYER_LENGTH,
            player_width: PLAYER_WIDTH,
            initial_obstacle_count: INITIAL_STATIC_OBSTACLES,
            initial_floating_obstacle_count: INITIAL_FLOATING_OBSTACLES,
            min_goal_distance: MIN_GOAL_DISTANCE,
            seed: None,
        }
    }
}

impl SimConfig {
    fn initial_difficulty(&self) -> Difficulty {
        Difficulty::initial(self.initial_obstacle_count, self.initial_floating_obstacle_count)
    }
}

/// Something the host should react to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickEvent {
    /// Obstacle hit; the game is paused until `advance`
    GameOver,
    /// Goal hit; `level` is the level just entered
    GoalReached { level: u32 },
}

/// Owns the authoritative game state
#[derive(Debug, Clone)]
pub struct Simulator {
    config: SimConfig,
    state: GameState,
    rng: Pcg32,
}

impl Simulator {
    /// Create a simulator and generate the first level
    pub fn new(config: SimConfig) -> Self {
        let seed = config.seed.unwrap_or(DEFAULT_SEED);
        let state = GameState::new(
            config.arena.grid_width,
            config.arena.grid_height,
            config.initial_difficulty(),
        );
        let mut sim = Self {
            config,
            state,
            rng: Pcg32::seed_from_u64(seed),
        };
        log::info!("Starting game with seed {}", seed);
        sim.regenerate();
        sim
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Read-only view for the render sink
    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    /// Host-side pause; ignored outside `Running`
    pub fn set_paused(&mut self, paused: bool) {
        if self.state.phase == GamePhase::Running {
            self.state.paused = paused;
        }
    }

    /// Advance the game by `dt_ms` with steering input in [-1, 1].
    ///
    /// Does nothing while paused. A non-positive `dt_ms` records the input
    /// and changes nothing else.
    pub fn step(&mut self, dt_ms: f32, steering: f32) -> Option<TickEvent> {
        if self.state.paused {
            return None;
        }
        let steering = if steering.is_finite() {
            steering.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        self.state.player.normalized_theta = steering;
        if dt_ms <= 0.0 || !dt_ms.is_finite() {
            return None;
        }

        let difficulty = self.state.difficulty;
        let player = &mut self.state.player;
        player.ease_heading(dt_ms, difficulty.max_theta);
        player.rotate_heading();
        let next = player.ahead(difficulty.speed * dt_ms);

        for hover in self.state.obstacles.iter_mut().filter_map(|o| o.hover.as_mut()) {
            hover.advance(dt_ms);
        }

        // Collide against the current footprint, then move regardless
        let event = self.check_collisions(dt_ms);
        self.state.player.pos = next;
        self.state.level_time_ms += f64::from(dt_ms);
        event
    }

    /// Test each hit-box point, nose first; the first collision ends the scan
    fn check_collisions(&mut self, dt_ms: f32) -> Option<TickEvent> {
        let arena = self.config.arena;
        let hit_box = self
            .state
            .player
            .hit_box(self.config.player_length, self.config.player_width);

        for point in hit_box {
            if !arena.contains(point, BOUND_MARGIN) {
                self.state
                    .add_score(-f64::from(dt_ms) / OUT_OF_BOUNDS_PENALTY_DIVISOR);
                continue;
            }
            let cell = arena.map_to_collision(point);
            let collision = match self.state.object_at(cell) {
                Some(object) if object.can_collide(&self.state.player) => object.handle_collision(),
                _ => continue,
            };
            return Some(self.resolve(collision));
        }
        None
    }

    fn resolve(&mut self, collision: Collision) -> TickEvent {
        self.state.paused = true;
        match collision {
            Collision::GameOver => {
                self.state.add_score(-OBSTACLE_PENALTY);
                self.state.phase = GamePhase::GameOver;
                log::info!(
                    "Game over on level {} with score {}",
                    self.state.level,
                    self.state.display_score()
                );
                TickEvent::GameOver
            }
            Collision::GoalReached => {
                self.state.add_score(GOAL_BONUS);
                self.state.level += 1;
                self.state.phase = GamePhase::GoalReached;
                log::info!(
                    "Goal reached after {:.1}s, entering level {}",
                    self.state.level_time_ms / 1000.0,
                    self.state.level
                );
                TickEvent::GoalReached {
                    level: self.state.level,
                }
            }
        }
    }

    /// Leave a `GoalReached` or `GameOver` pause.
    ///
    /// After a goal the difficulty ramps up and a new layout is generated
    /// around the player, who keeps position and heading. After a game over
    /// this is `restart`. Otherwise nothing happens.
    pub fn advance(&mut self) {
        match self.state.phase {
            GamePhase::GoalReached => {
                self.state.difficulty = self.state.difficulty.next_level();
                log::info!(
                    "Level {}: speed {:.4}, max turn {:.2} deg, {} static + {} floating obstacles",
                    self.state.level,
                    self.state.difficulty.speed,
                    self.state.difficulty.max_theta.to_degrees(),
                    self.state.difficulty.static_obstacles,
                    self.state.difficulty.floating_obstacles
                );
                self.regenerate();
            }
            GamePhase::GameOver => self.restart(),
            GamePhase::Initializing | GamePhase::Running => {}
        }
    }

    /// New game: spawn point, zero score, level 1, initial difficulty
    pub fn restart(&mut self) {
        log::info!("Restarting game");
        self.state.player = Player::spawn();
        self.state.score = 0.0;
        self.state.level = 1;
        self.state.difficulty = self.config.initial_difficulty();
        self.regenerate();
    }

    fn regenerate(&mut self) {
        self.state.phase = GamePhase::Initializing;
        self.state.paused = true;

        let arena = self.config.arena;
        let seed = arena.map_to_collision(self.state.player.pos);
        let spec = LevelSpec {
            static_obstacles: self.state.difficulty.static_obstacles,
            floating_obstacles: self.state.difficulty.floating_obstacles,
            min_goal_distance: self.config.min_goal_distance,
        };
        let level = generate_level(&arena, seed, spec, &mut self.rng);

        self.state.grid = level.grid;
        self.state.obstacles = level.obstacles;
        self.state.goal = Some(level.goal);
        self.start_level();
    }

    fn start_level(&mut self) {
        self.state.level_time_ms = 0.0;
        self.state.phase = GamePhase::Running;
        self.state.paused = false;
    }

    /// Replace the layout with static obstacles at `obstacles` and an optional
    /// goal, then resume play. Cells outside the grid are skipped.
    pub fn set_layout(&mut self, obstacles: &[GridPoint], goal: Option<GridPoint>) {
        let arena = self.config.arena;
        let mut grid = CollisionGrid::new(arena.grid_width, arena.grid_height);
        let mut placed = Vec::with_capacity(obstacles.len());

        for &cell in obstacles {
            if !grid.contains(cell) {
                log::warn!("Obstacle cell ({}, {}) outside the grid, skipped", cell.x, cell.y);
                continue;
            }
            if grid.insert(cell, Occupant::Obstacle(placed.len())).is_some() {
                log::warn!("Duplicate obstacle cell ({}, {})", cell.x, cell.y);
            }
            placed.push(Obstacle {
                cell,
                pos: arena.collision_to_map(cell),
                hover: None,
            });
        }

        self.state.goal = goal.filter(|cell| grid.contains(*cell)).map(|cell| {
            if grid.insert(cell, Occupant::Goal).is_some() {
                log::warn!(
                    "Goal cell ({}, {}) already held an obstacle, goal replaces it",
                    cell.x,
                    cell.y
                );
            }
            Goal {
                cell,
                pos: arena.collision_to_map(cell),
            }
        });
        self.state.grid = grid;
        self.state.obstacles = placed;
        self.start_level();
    }

    /// Move the player without touching the rest of the state
    pub fn place_player(&mut self, pos: MapPoint, dir: Vec3) {
        self.state.player = Player::new(pos, dir);
    }
}
