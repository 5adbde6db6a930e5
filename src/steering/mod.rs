//! Hand tracking steering estimator
//!
//! Turns a noisy webcam frame into a bounded steering value in [-1, 1].
//! Nothing here touches the camera or the DOM: callers hand in pixel buffers
//! and read the steering value back. Everything is synchronous and
//! allocation-light so it can run on a timer without blocking.

pub mod frame;
pub mod signal;
pub mod skin;
pub mod smoothing;
pub mod tracker;

pub use frame::{Frame, FrameError, PixelBuffer, PixelFormat};
pub use signal::SteeringSignal;
pub use skin::{Region, Rgb, SkinColorModel, calibrate};
pub use smoothing::Smoother;
pub use tracker::{Centroid, Estimate, FrameObserver, HandTracker, Pixel, TrackerConfig};
