//! Hand tracking end to end: frames in, steering out, simulator turning

use std::f32::consts::FRAC_2_PI;

use glam::Vec3;
use handtron::consts::*;
use handtron::sim::{MapPoint, SimConfig, Simulator};
use handtron::steering::{
    Frame, HandTracker, PixelFormat, Region, Rgb, SkinColorModel, SteeringSignal, TrackerConfig,
    calibrate,
};

const SKIN: Rgb = Rgb::new(200.0, 150.0, 120.0);

fn config() -> TrackerConfig {
    TrackerConfig {
        sampling_stride: 1,
        base_threshold: BASE_SKIN_THRESHOLD,
        min_point_count: 10,
        smoothing_alpha: 1.0,
        smoothing_window: None,
    }
}

/// 20 skin pixels around (cx, cy)
fn paint_hand(frame: &mut Frame, cx: u32, cy: u32) {
    for x in cx - 2..cx + 2 {
        for y in cy - 2..=cy + 2 {
            frame.set_pixel(x, y, SKIN);
        }
    }
}

fn tilted_hands() -> Frame {
    let mut frame = Frame::new(100, 100, PixelFormat::Rgba8);
    paint_hand(&mut frame, 10, 50);
    paint_hand(&mut frame, 90, 40);
    frame
}

#[test]
fn tilted_hands_scenario() {
    let mut tracker = HandTracker::new(SkinColorModel::new(SKIN), config());
    let estimate = tracker.estimate(&tilted_hands().view());

    assert!(estimate.confidence);
    let expected = FRAC_2_PI * (-0.125f32).asin();
    assert!((estimate.theta - expected).abs() < 1e-4);
    assert!((tracker.theta() + 0.0797).abs() < 1e-3);
}

#[test]
fn calibrated_from_a_frame() {
    let calibration = Frame::filled(64, 48, PixelFormat::Rgba8, SKIN);
    let skin = calibrate(&calibration.view(), Region::centered(64, 48, 10)).unwrap();
    assert_eq!(skin.reference(), SKIN);

    let mut tracker = HandTracker::new(skin, config());
    assert!(tracker.estimate(&tilted_hands().view()).confidence);
}

#[test]
fn missing_hand_keeps_steering() {
    let mut tracker = HandTracker::new(SkinColorModel::new(SKIN), config());
    tracker.estimate(&tilted_hands().view());
    let before = tracker.theta();

    let mut one_hand = Frame::new(100, 100, PixelFormat::Rgba8);
    paint_hand(&mut one_hand, 10, 50);
    let estimate = tracker.estimate(&one_hand.view());

    assert!(!estimate.confidence);
    assert!(!tracker.is_actively_steering());
    assert_eq!(tracker.theta(), before);
}

#[test]
fn signal_steers_the_simulator() {
    let signal = SteeringSignal::new();
    let mut tracker =
        HandTracker::new(SkinColorModel::new(SKIN), config()).with_signal(signal.clone());
    tracker.estimate(&tilted_hands().view());
    assert!(signal.is_active());

    let mut sim = Simulator::new(SimConfig::default());
    sim.set_layout(&[], None);
    sim.place_player(MapPoint::new(500.0, 500.0), Vec3::X);
    for _ in 0..20 {
        sim.step(TIMESTEP_MS, signal.theta());
    }

    let player = &sim.state().player;
    assert_eq!(player.normalized_theta, signal.theta());
    // Right hand higher in the image turns the heading toward -y
    assert!(player.cur_theta < 0.0);
    assert!(player.dir.y < 0.0);
}
