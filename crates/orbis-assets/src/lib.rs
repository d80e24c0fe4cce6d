//! Texture assets and asynchronous raster loading.
//!
//! Rasters decode on a worker pool and complete through a bounded channel
//! drained once per render cycle; everything else stays on the render thread.

mod loader;
mod texture;

pub use loader::{LoadError, LoadResult, LoadState, RasterLoader};
pub use texture::{Texture, TextureHandle, TextureOptions};
