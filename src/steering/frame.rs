//! Pixel buffer views over raw camera frames
//!
//! Browser frames arrive as RGBA `ImageData`, native captures are usually
//! packed RGB. Both are addressed by `(x, y)` in camera space.

use thiserror::Error;

use super::skin::Rgb;

/// Errors raised by frame access and calibration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    #[error("buffer holds {actual} bytes, expected {expected} for a {width}x{height} frame")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("pixel ({x}, {y}) is outside the {width}x{height} frame")]
    OutOfBounds { x: u32, y: u32, width: u32, height: u32 },
    #[error("calibration region is empty")]
    EmptyRegion,
}

/// Byte layout of a pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    Rgb8,
    #[default]
    Rgba8,
}

impl PixelFormat {
    /// Bytes per pixel
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }
}

fn expected_len(width: u32, height: u32, format: PixelFormat) -> usize {
    width as usize * height as usize * format.channels()
}

/// Read-only view over a rectangular frame buffer.
///
/// The view never owns the camera data; it only borrows one frame's bytes.
#[derive(Debug, Clone, Copy)]
pub struct PixelBuffer<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl<'a> PixelBuffer<'a> {
    /// Wrap a raw buffer, checking that its length matches the dimensions
    pub fn new(
        data: &'a [u8],
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<Self, FrameError> {
        let expected = expected_len(width, height, format);
        if data.len() != expected {
            return Err(FrameError::SizeMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            format,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Color at `(x, y)`, or an error if the coordinate is outside the frame
    pub fn try_pixel(&self, x: u32, y: u32) -> Result<Rgb, FrameError> {
        if x >= self.width || y >= self.height {
            return Err(FrameError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        let index = (y as usize * self.width as usize + x as usize) * self.format.channels();
        Ok(Rgb::new(
            self.data[index] as f32,
            self.data[index + 1] as f32,
            self.data[index + 2] as f32,
        ))
    }

    /// Color at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is outside the frame. Out-of-range access means
    /// a map-space or grid-space value leaked into camera space, so it is never
    /// clamped.
    pub fn pixel(&self, x: u32, y: u32) -> Rgb {
        match self.try_pixel(x, y) {
            Ok(color) => color,
            Err(err) => panic!("{err}"),
        }
    }
}

/// Owned, writable frame. Used for synthetic frames and for holding a copy of
/// the latest camera capture.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl Frame {
    /// Black frame of the given size
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let mut data = vec![0; expected_len(width, height, format)];
        if format == PixelFormat::Rgba8 {
            for alpha in data.iter_mut().skip(3).step_by(4) {
                *alpha = 255;
            }
        }
        Self {
            data,
            width,
            height,
            format,
        }
    }

    /// Frame filled with one color
    pub fn filled(width: u32, height: u32, format: PixelFormat, color: Rgb) -> Self {
        let mut frame = Self::new(width, height, format);
        for y in 0..height {
            for x in 0..width {
                frame.set_pixel(x, y, color);
            }
        }
        frame
    }

    /// Take ownership of raw bytes (e.g. a copied `ImageData` buffer)
    pub fn from_raw(
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<Self, FrameError> {
        PixelBuffer::new(&data, width, height, format)?;
        Ok(Self {
            data,
            width,
            height,
            format,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Borrow as a read-only view
    pub fn view(&self) -> PixelBuffer<'_> {
        PixelBuffer {
            data: &self.data,
            width: self.width,
            height: self.height,
            format: self.format,
        }
    }

    /// Write a color at `(x, y)`; components are rounded and clamped to 0..=255
    pub fn try_set_pixel(&mut self, x: u32, y: u32, color: Rgb) -> Result<(), FrameError> {
        if x >= self.width || y >= self.height {
            return Err(FrameError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        let index = (y as usize * self.width as usize + x as usize) * self.format.channels();
        let [r, g, b] = color.to_bytes();
        self.data[index] = r;
        self.data[index + 1] = g;
        self.data[index + 2] = b;
        Ok(())
    }

    /// Write a color at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is outside the frame.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgb) {
        if let Err(err) = self.try_set_pixel(x, y, color) {
            panic!("{err}");
        }
    }

    /// Raw bytes in the frame's pixel format
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_mismatch_rejected() {
        let data = vec![0u8; 10];
        let err = PixelBuffer::new(&data, 2, 2, PixelFormat::Rgb8).unwrap_err();
        assert_eq!(
            err,
            FrameError::SizeMismatch {
                width: 2,
                height: 2,
                expected: 12,
                actual: 10
            }
        );
    }

    #[test]
    fn test_rgba_addressing() {
        // 2x2 RGBA, pixel (1, 1) is the last four bytes
        let mut data = vec![0u8; 16];
        data[12..15].copy_from_slice(&[10, 20, 30]);
        let view = PixelBuffer::new(&data, 2, 2, PixelFormat::Rgba8).unwrap();
        assert_eq!(view.pixel(1, 1), Rgb::new(10.0, 20.0, 30.0));
        assert_eq!(view.pixel(0, 1), Rgb::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_set_and_read_back() {
        let mut frame = Frame::new(4, 3, PixelFormat::Rgb8);
        frame.set_pixel(3, 2, Rgb::new(200.0, 150.0, 120.0));
        assert_eq!(frame.view().pixel(3, 2), Rgb::new(200.0, 150.0, 120.0));
        assert_eq!(frame.as_bytes().len(), 36);
    }

    #[test]
    fn test_try_pixel_out_of_bounds() {
        let frame = Frame::new(4, 3, PixelFormat::Rgba8);
        assert!(matches!(
            frame.view().try_pixel(4, 0),
            Err(FrameError::OutOfBounds { x: 4, y: 0, .. })
        ));
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_pixel_out_of_bounds_panics() {
        let frame = Frame::new(4, 3, PixelFormat::Rgba8);
        frame.view().pixel(0, 3);
    }
}
