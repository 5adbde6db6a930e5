//! Skin color reference and calibration

use serde::{Deserialize, Serialize};

use super::frame::{FrameError, PixelBuffer};

/// An RGB color with 0..255 float components
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Squared Euclidean distance in RGB space
    #[inline]
    pub fn distance_squared(&self, other: &Rgb) -> f32 {
        let dr = self.r - other.r;
        let dg = self.g - other.g;
        let db = self.b - other.b;
        dr * dr + dg * dg + db * db
    }

    /// Round and clamp into bytes
    pub fn to_bytes(self) -> [u8; 3] {
        [
            self.r.round().clamp(0.0, 255.0) as u8,
            self.g.round().clamp(0.0, 255.0) as u8,
            self.b.round().clamp(0.0, 255.0) as u8,
        ]
    }
}

/// Calibrated reference skin tone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkinColorModel {
    reference: Rgb,
}

impl SkinColorModel {
    pub fn new(reference: Rgb) -> Self {
        Self { reference }
    }

    pub fn reference(&self) -> Rgb {
        self.reference
    }

    /// Squared RGB distance from the reference
    #[inline]
    pub fn distance_squared(&self, color: &Rgb) -> f32 {
        self.reference.distance_squared(color)
    }

    /// Strictly below `threshold` counts as skin, so a zero threshold never matches
    #[inline]
    pub fn is_skin(&self, color: &Rgb, threshold: f32) -> bool {
        self.distance_squared(color) < threshold
    }
}

/// Rectangle in pixel-buffer coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Square of `size` pixels centered in a `frame_width` x `frame_height` frame,
    /// shrunk to fit if the frame is smaller
    pub fn centered(frame_width: u32, frame_height: u32, size: u32) -> Self {
        let width = size.min(frame_width);
        let height = size.min(frame_height);
        Self {
            left: (frame_width - width) / 2,
            top: (frame_height - height) / 2,
            width,
            height,
        }
    }
}

/// Average every pixel of `region` into a skin color reference.
///
/// Runs once before tracking starts; the region should contain only skin
/// (a hand in a guide box, or the middle of the face).
pub fn calibrate(frame: &PixelBuffer<'_>, region: Region) -> Result<SkinColorModel, FrameError> {
    if region.width == 0 || region.height == 0 {
        return Err(FrameError::EmptyRegion);
    }
    // Check the far corner up front so a bad region fails before any work
    frame.try_pixel(region.left + region.width - 1, region.top + region.height - 1)?;

    let mut sum = Rgb::default();
    for x in region.left..region.left + region.width {
        for y in region.top..region.top + region.height {
            let color = frame.try_pixel(x, y)?;
            sum.r += color.r;
            sum.g += color.g;
            sum.b += color.b;
        }
    }

    let count = (region.width as f32) * (region.height as f32);
    let reference = Rgb::new(sum.r / count, sum.g / count, sum.b / count);
    log::info!(
        "Calibrated skin color ({:.1}, {:.1}, {:.1}) from {}x{} region",
        reference.r,
        reference.g,
        reference.b,
        region.width,
        region.height
    );
    Ok(SkinColorModel::new(reference))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steering::frame::{Frame, PixelFormat};

    #[test]
    fn test_calibrate_averages_region() {
        let mut frame = Frame::new(10, 10, PixelFormat::Rgba8);
        // Left half of a 2x2 region is (100, 50, 0), right half is (200, 150, 100)
        frame.set_pixel(4, 4, Rgb::new(100.0, 50.0, 0.0));
        frame.set_pixel(4, 5, Rgb::new(100.0, 50.0, 0.0));
        frame.set_pixel(5, 4, Rgb::new(200.0, 150.0, 100.0));
        frame.set_pixel(5, 5, Rgb::new(200.0, 150.0, 100.0));

        let model = calibrate(&frame.view(), Region::new(4, 4, 2, 2)).unwrap();
        assert_eq!(model.reference(), Rgb::new(150.0, 100.0, 50.0));
    }

    #[test]
    fn test_calibrate_rejects_bad_regions() {
        let frame = Frame::new(10, 10, PixelFormat::Rgb8);
        assert_eq!(
            calibrate(&frame.view(), Region::new(0, 0, 0, 5)),
            Err(FrameError::EmptyRegion)
        );
        assert!(matches!(
            calibrate(&frame.view(), Region::new(8, 8, 4, 1)),
            Err(FrameError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_is_skin_is_strict() {
        let model = SkinColorModel::new(Rgb::new(200.0, 150.0, 120.0));
        let exact = Rgb::new(200.0, 150.0, 120.0);
        assert!(model.is_skin(&exact, 1.0));
        assert!(!model.is_skin(&exact, 0.0));
        // distance^2 = 100
        let near = Rgb::new(210.0, 150.0, 120.0);
        assert!(!model.is_skin(&near, 100.0));
        assert!(model.is_skin(&near, 100.5));
    }

    #[test]
    fn test_centered_region() {
        assert_eq!(Region::centered(400, 300, 100), Region::new(150, 100, 100, 100));
        assert_eq!(Region::centered(50, 40, 100), Region::new(0, 0, 50, 40));
    }
}
