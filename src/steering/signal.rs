//! Shared steering scalar between the tracking and simulation loops
//!
//! The tracker writes, the simulation reads. In the browser both run on one
//! thread, but on native hosts the two loops are separate timers/threads, so
//! the value lives in atomics.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

#[derive(Debug)]
struct Shared {
    theta_bits: AtomicU32,
    active: AtomicBool,
}

/// Cloneable handle to the latest normalized steering value
#[derive(Debug, Clone)]
pub struct SteeringSignal {
    shared: Arc<Shared>,
}

impl Default for SteeringSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl SteeringSignal {
    /// Starts straight ahead, not actively steering
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                theta_bits: AtomicU32::new(0.0f32.to_bits()),
                active: AtomicBool::new(false),
            }),
        }
    }

    /// Store a new value (single writer)
    pub fn publish(&self, theta: f32, active: bool) {
        self.shared.theta_bits.store(theta.to_bits(), Ordering::Release);
        self.shared.active.store(active, Ordering::Release);
    }

    /// Latest normalized steering value
    pub fn theta(&self) -> f32 {
        f32::from_bits(self.shared.theta_bits.load(Ordering::Acquire))
    }

    /// Whether the tracker saw both hands in its last frame
    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::Acquire)
    }
}
