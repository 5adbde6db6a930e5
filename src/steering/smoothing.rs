//! Temporal smoothing of raw steering angles

use serde::{Deserialize, Serialize};

/// Smoothing state for the raw steering angle (radians).
///
/// `Exponential` is the default. `Window` keeps the last `n` raw angles and
/// reports their mean; it starts filled with zeros, so it eases in from
/// straight ahead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Smoother {
    Exponential { alpha: f32, current: f32 },
    Window { samples: Vec<f32>, offset: usize },
}

impl Smoother {
    /// Exponentially weighted average with weight `alpha` on the newest sample
    pub fn exponential(alpha: f32) -> Self {
        Smoother::Exponential {
            alpha,
            current: 0.0,
        }
    }

    /// Mean over a ring buffer of `size` samples (at least one)
    pub fn window(size: usize) -> Self {
        Smoother::Window {
            samples: vec![0.0; size.max(1)],
            offset: 0,
        }
    }

    /// Feed one raw angle. Returns false (and keeps the previous value) if the
    /// update would make the reported angle NaN or infinite.
    pub fn update(&mut self, raw: f32) -> bool {
        match self {
            Smoother::Exponential { alpha, current } => {
                let updated = *alpha * raw + (1.0 - *alpha) * *current;
                if !updated.is_finite() {
                    return false;
                }
                *current = updated;
                true
            }
            Smoother::Window { samples, offset } => {
                if !raw.is_finite() {
                    return false;
                }
                samples[*offset] = raw;
                *offset = (*offset + 1) % samples.len();
                true
            }
        }
    }

    /// Current smoothed angle (radians)
    pub fn value(&self) -> f32 {
        match self {
            Smoother::Exponential { current, .. } => *current,
            Smoother::Window { samples, .. } => {
                samples.iter().sum::<f32>() / samples.len() as f32
            }
        }
    }

    /// Back to straight ahead
    pub fn reset(&mut self) {
        match self {
            Smoother::Exponential { current, .. } => *current = 0.0,
            Smoother::Window { samples, offset } => {
                samples.iter_mut().for_each(|s| *s = 0.0);
                *offset = 0;
            }
        }
    }
}
