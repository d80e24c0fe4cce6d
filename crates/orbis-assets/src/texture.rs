//! CPU-side texture values: a decoded raster plus sampling options.

use std::sync::Arc;

use orbis_raster::Raster;

/// Sampling options carried alongside a texture for the upload stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureOptions {
    /// Whether the image is flipped vertically at upload.
    pub flip_y: bool,
    /// Anisotropic filtering level.
    pub anisotropic: u32,
}

impl Default for TextureOptions {
    fn default() -> Self {
        // Globe textures are authored with the V axis matching the sphere's
        // UV layout, so no flip; 8x anisotropy keeps the poles sharp.
        Self {
            flip_y: false,
            anisotropic: 8,
        }
    }
}

/// A decoded raster paired with its sampling options.
#[derive(Clone, Debug)]
pub struct Texture {
    /// Decoded pixel data.
    pub raster: Arc<Raster>,
    /// Sampling options for upload.
    pub options: TextureOptions,
}

/// Shared handle to an immutable texture.
pub type TextureHandle = Arc<Texture>;

impl Texture {
    /// Wrap a raster with the given options.
    pub fn new(raster: Arc<Raster>, options: TextureOptions) -> TextureHandle {
        Arc::new(Self { raster, options })
    }

    /// A 1×1 fully-transparent texture.
    pub fn transparent() -> TextureHandle {
        Self::new(Arc::new(Raster::transparent()), TextureOptions::default())
    }

    /// Returns `true` if every texel is fully transparent.
    pub fn is_fully_transparent(&self) -> bool {
        self.raster.pixels().chunks_exact(4).all(|px| px[3] == 0)
    }
}
