//! Simulator behaviour through the public API

use glam::Vec3;
use handtron::consts::*;
use handtron::sim::{Difficulty, GamePhase, GridPoint, MapPoint, SimConfig, Simulator, TickEvent};

/// Center of cell (5, 5), facing +x toward cell (6, 5)
fn facing_cell_six(obstacles: &[GridPoint], goal: Option<GridPoint>) -> Simulator {
    let mut sim = Simulator::new(SimConfig::default());
    sim.set_layout(obstacles, goal);
    sim.place_player(MapPoint::new(275.0, 275.0), Vec3::X);
    sim
}

/// Step straight ahead until something happens
fn drive(sim: &mut Simulator, max_steps: usize) -> Option<(usize, TickEvent)> {
    (1..=max_steps).find_map(|i| sim.step(TIMESTEP_MS, 0.0).map(|event| (i, event)))
}

#[test]
fn obstacle_one_cell_ahead_ends_the_game() {
    let mut sim = facing_cell_six(&[GridPoint::new(6, 5)], None);

    let (steps, event) = drive(&mut sim, 200).expect("obstacle never hit");
    assert_eq!(event, TickEvent::GameOver);
    assert_eq!(sim.phase(), GamePhase::GameOver);
    assert!(sim.state().paused);

    // 25 units to the cell edge at SPEED per ms
    let expected = (25.0 / (SPEED * TIMESTEP_MS)).ceil() as usize + 1;
    assert!(steps <= expected, "took {steps} steps, expected at most {expected}");

    // Paused: further steps do nothing
    let pos = sim.state().player.pos;
    assert_eq!(sim.step(TIMESTEP_MS, 1.0), None);
    assert_eq!(sim.state().player.pos, pos);
}

#[test]
fn goal_one_cell_ahead_advances_the_level() {
    let mut sim = facing_cell_six(&[], Some(GridPoint::new(6, 5)));

    let (_, event) = drive(&mut sim, 200).expect("goal never reached");
    assert_eq!(event, TickEvent::GoalReached { level: 2 });
    assert_eq!(sim.phase(), GamePhase::GoalReached);
    assert_eq!(sim.state().score, GOAL_BONUS);
    assert_eq!(sim.state().level, 2);
    assert!(sim.state().paused);

    let player = sim.state().player.clone();
    sim.advance();

    let state = sim.state();
    assert_eq!(sim.phase(), GamePhase::Running);
    assert!(!state.paused);
    assert_eq!(state.player.pos, player.pos);
    assert_eq!(state.player.dir, player.dir);
    assert_eq!(state.score, GOAL_BONUS);
    assert_eq!(state.difficulty, Difficulty::default().next_level());
    assert_eq!(state.obstacles.len(), 40);

    // Regenerated around the player's cell
    let goal = state.goal.as_ref().expect("no goal after advance");
    let cell = sim.config().arena.map_to_collision(player.pos);
    assert!((goal.cell.x - cell.x).abs() > 1 || (goal.cell.y - cell.y).abs() > 1);
    for spawn_cell in cell.surrounding() {
        assert!(state.grid.get(spawn_cell).is_none());
    }
}

#[test]
fn floating_obstacles_stay_in_band() {
    let mut sim = Simulator::new(SimConfig {
        seed: Some(1),
        ..Default::default()
    });
    for _ in 0..500 {
        if sim.step(TIMESTEP_MS, 0.3).is_some() {
            sim.advance();
        }
        for hover in sim.state().obstacles.iter().filter_map(|o| o.hover) {
            assert!((0.0..=FLOATING_OBSTACLE_MAX_HEIGHT).contains(&hover.z));
        }
    }
}

#[test]
fn seeded_runs_are_reproducible() {
    let config = SimConfig {
        seed: Some(2024),
        ..Default::default()
    };
    let run = || {
        let mut sim = Simulator::new(config);
        let mut events = Vec::new();
        for i in 0..2000 {
            let steering = ((i as f32) * 0.013).sin() * 0.8;
            if let Some(event) = sim.step(TIMESTEP_MS, steering) {
                events.push((i, event));
                sim.advance();
            }
        }
        (events, sim.state().score, sim.state().player.pos)
    };
    assert_eq!(run(), run());
}

#[test]
fn restart_resets_to_spawn() {
    let mut sim = facing_cell_six(&[GridPoint::new(6, 5)], None);
    drive(&mut sim, 200);
    sim.restart();

    let state = sim.state();
    assert_eq!(state.player.pos, MapPoint::new(SPAWN_POS.0, SPAWN_POS.1));
    assert_eq!(state.level, 1);
    assert_eq!(state.score, 0.0);
    assert_eq!(state.obstacles.len(), 20);
    assert_eq!(sim.phase(), GamePhase::Running);
}
