//! Procedural level generation
//!
//! Obstacles go down first, at random free cells (rejection sampling). The
//! goal is then chosen by breadth-first search from the player's cell over
//! free cells, among those at least `min_goal_distance` steps away, so it is
//! always reachable and never trivially close.

use rand::Rng;

use super::geometry::{Arena, GridPoint};
use super::grid::{CollisionGrid, Occupant};
use super::state::{Goal, Hover, Obstacle};
use crate::consts::*;

/// Object counts and goal distance for one level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelSpec {
    pub static_obstacles: u32,
    pub floating_obstacles: u32,
    pub min_goal_distance: u32,
}

/// A generated layout
#[derive(Debug, Clone)]
pub struct Level {
    pub grid: CollisionGrid,
    pub obstacles: Vec<Obstacle>,
    pub goal: Goal,
    /// BFS path length from the seed to the goal; `None` for the random fallback
    pub goal_distance: Option<u32>,
    /// Distance threshold in force when the goal was placed
    pub min_goal_distance: u32,
}

/// Build a level around `seed` (the player's cell, clamped into the grid).
///
/// The seed cell and its 8 neighbors stay empty. If no cell is far enough
/// away, the whole layout is regenerated with a lower threshold, up to
/// `GOAL_RETRY_DEPTH` times; after that the goal goes on any free cell.
///
/// # Panics
///
/// Panics if the grid has no cell outside the reserved block (fewer than 10
/// cells); `Settings::validate` rejects such grids.
pub fn generate_level<R: Rng>(arena: &Arena, seed: GridPoint, spec: LevelSpec, rng: &mut R) -> Level {
    let seed = arena.clamp_cell(seed);
    assert!(
        arena.grid_width as usize * arena.grid_height as usize >= MIN_GRID_CELLS,
        "{}x{} grid leaves no room for a goal",
        arena.grid_width,
        arena.grid_height
    );
    let mut min_distance = spec.min_goal_distance;

    for attempt in 0..=GOAL_RETRY_DEPTH {
        let (mut grid, obstacles) = place_obstacles(arena, seed, spec, rng);
        let candidates: Vec<(GridPoint, u32)> = grid
            .reachable_at_least(seed, min_distance)
            .into_iter()
            .filter(|(cell, _)| !is_reserved(seed, *cell))
            .collect();

        if !candidates.is_empty() {
            let (cell, distance) = candidates[rng.random_range(0..candidates.len())];
            let goal = place_goal(arena, &mut grid, cell);
            log::info!(
                "Generated level: {} obstacles, goal at ({}, {}) {} steps away (min {})",
                obstacles.len(),
                cell.x,
                cell.y,
                distance,
                min_distance
            );
            return Level {
                grid,
                obstacles,
                goal,
                goal_distance: Some(distance),
                min_goal_distance: min_distance,
            };
        }

        if attempt < GOAL_RETRY_DEPTH {
            let relaxed = (u64::from(min_distance) * 4 / 5) as u32;
            log::warn!(
                "No goal cell {} steps from ({}, {}), regenerating with {}",
                min_distance,
                seed.x,
                seed.y,
                relaxed
            );
            min_distance = relaxed;
        } else {
            let cell = random_free_cell(&grid, seed, rng);
            log::warn!(
                "Goal search exhausted after {} retries, placing goal at random cell ({}, {})",
                GOAL_RETRY_DEPTH,
                cell.x,
                cell.y
            );
            let goal = place_goal(arena, &mut grid, cell);
            return Level {
                grid,
                obstacles,
                goal,
                goal_distance: None,
                min_goal_distance: min_distance,
            };
        }
    }
    unreachable!("the final attempt always places a goal")
}

fn is_reserved(seed: GridPoint, cell: GridPoint) -> bool {
    (cell.x - seed.x).abs() <= 1 && (cell.y - seed.y).abs() <= 1
}

/// Cells left for obstacles once the reserved block and one goal cell are set aside
fn obstacle_capacity(grid: &CollisionGrid, seed: GridPoint) -> u32 {
    let reserved = seed.surrounding().filter(|c| grid.contains(*c)).count();
    grid.len().saturating_sub(reserved + 1) as u32
}

fn place_obstacles<R: Rng>(
    arena: &Arena,
    seed: GridPoint,
    spec: LevelSpec,
    rng: &mut R,
) -> (CollisionGrid, Vec<Obstacle>) {
    let mut grid = CollisionGrid::new(arena.grid_width, arena.grid_height);

    let capacity = obstacle_capacity(&grid, seed);
    let mut static_count = spec.static_obstacles;
    let mut floating_count = spec.floating_obstacles;
    if static_count.saturating_add(floating_count) > capacity {
        static_count = static_count.min(capacity);
        floating_count = floating_count.min(capacity - static_count);
        log::warn!(
            "Grid only fits {} obstacles, placing {} static and {} floating",
            capacity,
            static_count,
            floating_count
        );
    }

    let mut obstacles = Vec::with_capacity((static_count + floating_count) as usize);
    for i in 0..static_count + floating_count {
        let cell = random_free_cell(&grid, seed, rng);
        let hover = (i >= static_count).then(|| Hover {
            z: rng.random_range(0.0..FLOATING_OBSTACLE_MAX_HEIGHT).floor(),
            rising: rng.random_bool(0.5),
        });
        grid.insert(cell, Occupant::Obstacle(obstacles.len()));
        obstacles.push(Obstacle {
            cell,
            pos: arena.collision_to_map(cell),
            hover,
        });
    }
    (grid, obstacles)
}

/// Uniformly random empty cell outside the reserved block. Resamples until it
/// hits one; callers keep at least one such cell free.
fn random_free_cell<R: Rng>(grid: &CollisionGrid, seed: GridPoint, rng: &mut R) -> GridPoint {
    loop {
        let cell = GridPoint::new(
            rng.random_range(0..grid.width() as i32),
            rng.random_range(0..grid.height() as i32),
        );
        if grid.is_free(cell) && !is_reserved(seed, cell) {
            return cell;
        }
    }
}

fn place_goal(arena: &Arena, grid: &mut CollisionGrid, cell: GridPoint) -> Goal {
    if let Some(previous) = grid.insert(cell, Occupant::Goal) {
        log::warn!(
            "Goal cell ({}, {}) already held {:?}, goal replaces it",
            cell.x,
            cell.y,
            previous
        );
    }
    Goal {
        cell,
        pos: arena.collision_to_map(cell),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn spec(static_obstacles: u32, floating_obstacles: u32) -> LevelSpec {
        LevelSpec {
            static_obstacles,
            floating_obstacles,
            min_goal_distance: MIN_GOAL_DISTANCE,
        }
    }

    #[test]
    fn test_counts_and_kinds() {
        let arena = Arena::default();
        let mut rng = Pcg32::seed_from_u64(7);
        let level = generate_level(&arena, GridPoint::new(1, 1), spec(10, 10), &mut rng);

        assert_eq!(level.obstacles.len(), 20);
        assert_eq!(level.obstacles.iter().filter(|o| o.hover.is_none()).count(), 10);
        for o in level.obstacles.iter().filter_map(|o| o.hover) {
            assert!((0.0..FLOATING_OBSTACLE_MAX_HEIGHT).contains(&o.z));
        }
        assert_eq!(level.grid.occupied_count(), 21);
        assert_eq!(level.grid.get(level.goal.cell), Some(Occupant::Goal));
    }

    #[test]
    fn test_obstacles_indexed_by_grid() {
        let arena = Arena::default();
        let mut rng = Pcg32::seed_from_u64(11);
        let level = generate_level(&arena, GridPoint::new(10, 10), spec(30, 30), &mut rng);
        for (i, o) in level.obstacles.iter().enumerate() {
            assert_eq!(level.grid.get(o.cell), Some(Occupant::Obstacle(i)));
            assert_eq!(o.pos, arena.collision_to_map(o.cell));
        }
    }

    #[test]
    fn test_same_seed_same_level() {
        let arena = Arena::default();
        let a = generate_level(&arena, GridPoint::new(1, 1), spec(10, 10), &mut Pcg32::seed_from_u64(3));
        let b = generate_level(&arena, GridPoint::new(1, 1), spec(10, 10), &mut Pcg32::seed_from_u64(3));
        assert_eq!(a.grid, b.grid);
        assert_eq!(a.goal, b.goal);
    }

    #[test]
    fn test_small_map_relaxes_then_falls_back() {
        // 4x4 grid: longest path from a corner is 6, far below 25
        let arena = Arena {
            map_width: 200.0,
            map_height: 200.0,
            grid_width: 4,
            grid_height: 4,
        };
        let mut rng = Pcg32::seed_from_u64(5);
        let level = generate_level(&arena, GridPoint::new(0, 0), spec(0, 0), &mut rng);
        // 25 -> 20 -> 16 -> 12 -> 9 -> 7: still too far, so the random fallback is used
        assert_eq!(level.goal_distance, None);
        assert_eq!(level.min_goal_distance, 7);
        assert!(!is_reserved(GridPoint::new(0, 0), level.goal.cell));
    }

    #[test]
    fn test_relaxation_finds_closer_goal() {
        // 5x5 from a corner: max path length 8, reachable once the threshold drops to 7
        let arena = Arena {
            map_width: 250.0,
            map_height: 250.0,
            grid_width: 5,
            grid_height: 5,
        };
        let mut rng = Pcg32::seed_from_u64(5);
        let level = generate_level(&arena, GridPoint::new(0, 0), spec(0, 0), &mut rng);
        assert_eq!(level.min_goal_distance, 7);
        assert!(level.goal_distance.is_some_and(|d| d >= 7));
    }

    #[test]
    fn test_overfull_request_is_clamped() {
        let arena = Arena {
            map_width: 250.0,
            map_height: 250.0,
            grid_width: 5,
            grid_height: 5,
        };
        let mut rng = Pcg32::seed_from_u64(9);
        let level = generate_level(&arena, GridPoint::new(2, 2), spec(40, 40), &mut rng);
        // 25 cells - 9 reserved - 1 goal
        assert_eq!(level.obstacles.len(), 15);
        assert_eq!(level.grid.occupied_count(), 16);
        assert_eq!(level.goal_distance, None);
    }

    #[test]
    fn test_huge_requests_do_not_overflow() {
        let arena = Arena::default();
        let mut rng = Pcg32::seed_from_u64(13);
        let level = generate_level(
            &arena,
            GridPoint::new(10, 10),
            LevelSpec {
                static_obstacles: u32::MAX,
                floating_obstacles: 1,
                min_goal_distance: u32::MAX,
            },
            &mut rng,
        );
        // 400 cells - 9 reserved - 1 goal, all static
        assert_eq!(level.obstacles.len(), 390);
        assert!(level.obstacles.iter().all(|o| o.hover.is_none()));
        // Five relaxations of 80% each
        assert!((u32::MAX / 4..u32::MAX / 3).contains(&level.min_goal_distance));
        assert_eq!(level.goal_distance, None);
    }

    proptest! {
        #[test]
        fn prop_spawn_block_stays_empty(
            seed in any::<u64>(),
            x in -2i32..22,
            y in -2i32..22,
            static_obstacles in 0u32..=45,
            floating_obstacles in 0u32..=85,
        ) {
            let arena = Arena::default();
            let mut rng = Pcg32::seed_from_u64(seed);
            let spawn = GridPoint::new(x, y);
            let level = generate_level(
                &arena,
                spawn,
                spec(static_obstacles, floating_obstacles),
                &mut rng,
            );

            for cell in arena.clamp_cell(spawn).surrounding() {
                prop_assert!(level.grid.get(cell).is_none());
            }
            // One object per cell: every obstacle and the goal own distinct cells
            let expected = level.obstacles.len() + 1;
            prop_assert_eq!(level.grid.occupied_count(), expected);
            let mut cells: Vec<_> = level.obstacles.iter().map(|o| o.cell).collect();
            cells.push(level.goal.cell);
            cells.sort_by_key(|c| (c.x, c.y));
            cells.dedup();
            prop_assert_eq!(cells.len(), expected);
        }

        #[test]
        fn prop_goal_reachable_at_distance(
            seed in any::<u64>(),
            x in 0i32..20,
            y in 0i32..20,
            static_obstacles in 0u32..=45,
            floating_obstacles in 0u32..=85,
        ) {
            let arena = Arena::default();
            let mut rng = Pcg32::seed_from_u64(seed);
            let spawn = GridPoint::new(x, y);
            let level = generate_level(
                &arena,
                spawn,
                spec(static_obstacles, floating_obstacles),
                &mut rng,
            );

            if let Some(distance) = level.goal_distance {
                prop_assert!(distance >= level.min_goal_distance);
                // Re-run the search with the goal cell emptied
                let mut grid = level.grid.clone();
                grid.remove(level.goal.cell);
                let lengths = grid.path_lengths(spawn);
                let index = (level.goal.cell.y * 20 + level.goal.cell.x) as usize;
                prop_assert_eq!(lengths[index], Some(distance));
            }
        }
    }
}
