//! Dual-centroid steering estimator
//!
//! Each frame is scanned on a sparse grid. Pixels close enough to the
//! calibrated skin tone are split into left and right halves of the image;
//! the tilt of the line between the two centroids is the steering wheel
//! angle.
//!
//! The skin threshold scales with horizontal distance from the image center:
//! the middle column (usually torso or background) can never match, and the
//! edges, where hands are held, match most easily.

use std::f32::consts::FRAC_2_PI;

use serde::{Deserialize, Serialize};

use super::frame::PixelBuffer;
use super::signal::SteeringSignal;
use super::skin::SkinColorModel;
use super::smoothing::Smoother;
use crate::consts::*;

/// Tracker tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Sample every n-th column and row (>= 1)
    pub sampling_stride: u32,
    /// Squared RGB distance cutoff at the image edges
    pub base_threshold: f32,
    /// Skin pixels needed on each side before the frame is trusted (>= 1)
    pub min_point_count: usize,
    /// Weight of the newest angle in (0, 1]
    pub smoothing_alpha: f32,
    /// Use a ring buffer of this many angles instead of exponential smoothing
    pub smoothing_window: Option<usize>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            sampling_stride: SAMPLING_STRIDE,
            base_threshold: BASE_SKIN_THRESHOLD,
            min_point_count: MIN_POINT_COUNT,
            smoothing_alpha: SMOOTHING_ALPHA,
            smoothing_window: None,
        }
    }
}

impl TrackerConfig {
    fn smoother(&self) -> Smoother {
        match self.smoothing_window {
            Some(size) => Smoother::window(size),
            None => Smoother::exponential(self.smoothing_alpha),
        }
    }
}

/// A sampled frame location (camera space)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pixel {
    pub x: u32,
    pub y: u32,
}

/// Mean position of one side's skin pixels (camera space)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Centroid {
    pub x: f32,
    pub y: f32,
}

/// Result of one `estimate` call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    /// Normalized steering value after this frame, roughly in [-1, 1]
    pub theta: f32,
    /// Both hands were found; false means the previous state was kept
    pub confidence: bool,
}

/// Receives the classified pixels after every frame (debug overlay)
pub trait FrameObserver: Send {
    fn frame_processed(&mut self, skin_pixels: &[Pixel], left: Centroid, right: Centroid);
}

impl<F> FrameObserver for F
where
    F: FnMut(&[Pixel], Centroid, Centroid) + Send,
{
    fn frame_processed(&mut self, skin_pixels: &[Pixel], left: Centroid, right: Centroid) {
        self(skin_pixels, left, right)
    }
}

/// Owns calibration and smoothing state for one camera
pub struct HandTracker {
    config: TrackerConfig,
    skin: SkinColorModel,
    smoother: Smoother,
    left: Centroid,
    right: Centroid,
    active: bool,
    skin_pixels: Vec<Pixel>,
    observer: Option<Box<dyn FrameObserver>>,
    signal: Option<SteeringSignal>,
}

impl HandTracker {
    pub fn new(skin: SkinColorModel, config: TrackerConfig) -> Self {
        let smoother = config.smoother();
        Self {
            config,
            skin,
            smoother,
            left: Centroid::default(),
            right: Centroid::default(),
            active: false,
            skin_pixels: Vec::new(),
            observer: None,
            signal: None,
        }
    }

    /// Publish every estimate to a shared signal
    pub fn with_signal(mut self, signal: SteeringSignal) -> Self {
        signal.publish(self.theta(), self.active);
        self.signal = Some(signal);
        self
    }

    /// Report classified pixels and centroids after each frame
    pub fn with_observer(mut self, observer: impl FrameObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn skin_color(&self) -> &SkinColorModel {
        &self.skin
    }

    /// Swap in a new skin reference and start smoothing from scratch
    pub fn recalibrate(&mut self, skin: SkinColorModel) {
        self.skin = skin;
        self.reset();
    }

    /// Forget smoothing state and last known centroids
    pub fn reset(&mut self) {
        self.smoother.reset();
        self.left = Centroid::default();
        self.right = Centroid::default();
        self.active = false;
        if let Some(signal) = &self.signal {
            signal.publish(self.theta(), false);
        }
    }

    /// Normalized steering value: the smoothed angle scaled by 2/pi
    pub fn theta(&self) -> f32 {
        // Rounding can push a full-lock angle an ulp past 1
        (FRAC_2_PI * self.smoother.value()).clamp(-1.0, 1.0)
    }

    /// Whether the last frame had enough skin pixels on both sides
    pub fn is_actively_steering(&self) -> bool {
        self.active
    }

    /// Last confidently detected centroids (left, right)
    pub fn centroids(&self) -> (Centroid, Centroid) {
        (self.left, self.right)
    }

    /// Process one frame and update the steering value
    pub fn estimate(&mut self, frame: &PixelBuffer<'_>) -> Estimate {
        let width = frame.width();
        let height = frame.height();
        let half_width = width as f32 / 2.0;
        let stride = self.config.sampling_stride.max(1) as usize;

        self.skin_pixels.clear();
        for x in (0..width).step_by(stride) {
            let center_distance = (x as f32 - half_width).abs() / half_width;
            let threshold = self.config.base_threshold * center_distance;
            for y in (0..height).step_by(stride) {
                if self.skin.is_skin(&frame.pixel(x, y), threshold) {
                    self.skin_pixels.push(Pixel { x, y });
                }
            }
        }

        let mut left_sum = (0.0f32, 0.0f32);
        let mut right_sum = (0.0f32, 0.0f32);
        let mut left_count = 0usize;
        let mut right_count = 0usize;
        for pixel in &self.skin_pixels {
            if (pixel.x as f32) < half_width {
                left_sum.0 += pixel.x as f32;
                left_sum.1 += pixel.y as f32;
                left_count += 1;
            } else {
                right_sum.0 += pixel.x as f32;
                right_sum.1 += pixel.y as f32;
                right_count += 1;
            }
        }

        let min = self.config.min_point_count.max(1);
        self.active = left_count >= min && right_count >= min;
        if self.active {
            let left = Centroid {
                x: left_sum.0 / left_count as f32,
                y: left_sum.1 / left_count as f32,
            };
            let right = Centroid {
                x: right_sum.0 / right_count as f32,
                y: right_sum.1 / right_count as f32,
            };
            self.left = left;
            self.right = right;

            // asin of an out-of-range slope is NaN and gets rejected by the smoother
            let raw = if right.x != left.x {
                ((right.y - left.y) / (right.x - left.x)).asin()
            } else {
                0.0
            };
            if !self.smoother.update(raw) {
                log::debug!("Rejected non-finite steering angle (raw {raw})");
            }
        } else {
            log::debug!(
                "Hands not detected (left {left_count}, right {right_count}, need {min})"
            );
        }

        if let Some(observer) = self.observer.as_mut() {
            observer.frame_processed(&self.skin_pixels, self.left, self.right);
        }

        let theta = self.theta();
        if let Some(signal) = &self.signal {
            signal.publish(theta, self.active);
        }
        Estimate {
            theta,
            confidence: self.active,
        }
    }
}
