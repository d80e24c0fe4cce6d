//! RGBA8 pixel buffers decoded from image files or built in memory.

use std::path::Path;

/// Errors that can occur constructing or decoding a raster.
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    /// Width or height is zero.
    #[error("raster dimensions must be non-zero, got {width}x{height}")]
    ZeroDimensions { width: u32, height: u32 },

    /// Pixel data length doesn't match the expected size for the dimensions.
    #[error("raster data size ({actual}) does not match expected ({expected}) for {width}x{height} RGBA8")]
    DataSizeMismatch {
        actual: usize,
        expected: usize,
        width: u32,
        height: u32,
    },

    /// The image could not be read or decoded.
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// An immutable width × height RGBA8 pixel buffer.
///
/// Construction validates dimensions, so every `Raster` has at least one
/// pixel and a buffer of exactly `width * height * 4` bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Raster {
    /// Build a raster from raw RGBA8 bytes.
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::ZeroDimensions { width, height });
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(RasterError::DataSizeMismatch {
                actual: pixels.len(),
                expected,
                width,
                height,
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Decode a raster from encoded image bytes (PNG or JPEG).
    pub fn decode(bytes: &[u8]) -> Result<Self, RasterError> {
        let decoded = image::load_from_memory(bytes)?.to_rgba8();
        Self::from_rgba8(decoded.width(), decoded.height(), decoded.into_raw())
    }

    /// Read and decode a raster from an image file on disk.
    pub fn open(path: &Path) -> Result<Self, RasterError> {
        let decoded = image::open(path)?.to_rgba8();
        Self::from_rgba8(decoded.width(), decoded.height(), decoded.into_raw())
    }

    /// A raster filled with a single RGBA value.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, RasterError> {
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..width as usize * height as usize {
            pixels.extend_from_slice(&rgba);
        }
        Self::from_rgba8(width, height, pixels)
    }

    /// The shared 1×1 fully-transparent placeholder pixel.
    pub fn transparent() -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![255, 255, 255, 0],
        }
    }

    /// Width in texels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in texels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The raw RGBA8 pixel buffer, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// The RGBA value at texel `(px, py)`.
    ///
    /// # Panics
    ///
    /// Panics if `px >= width` or `py >= height`.
    pub fn rgba_at(&self, px: u32, py: u32) -> [u8; 4] {
        assert!(px < self.width && py < self.height, "texel out of bounds");
        let idx = (py as usize * self.width as usize + px as usize) * 4;
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }

    /// The red channel at texel `(px, py)`.
    pub fn red_at(&self, px: u32, py: u32) -> u8 {
        self.rgba_at(px, py)[0]
    }
}
