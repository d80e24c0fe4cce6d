//! Point-sampled displacement lookup over a raster heightmap.

use std::sync::Arc;

use crate::raster::Raster;

/// Samples displacement factors from a raster's red channel by UV.
///
/// Uses nearest-pixel point sampling, no interpolation: the texel is chosen
/// as `round(u * (width - 1))`, `round(v * (height - 1))`, mirroring raw
/// per-texel reads. Inputs outside `[0, 1]` clamp to the pixel grid.
#[derive(Clone, Debug)]
pub struct HeightField {
    raster: Arc<Raster>,
}

impl HeightField {
    /// Wrap a decoded raster as a height field.
    pub fn new(raster: Arc<Raster>) -> Self {
        Self { raster }
    }

    /// The underlying raster.
    pub fn raster(&self) -> &Arc<Raster> {
        &self.raster
    }

    /// Sample the displacement factor at `(u, v)`, in `[0, 1]`.
    ///
    /// Returns the red channel of the nearest texel divided by 255. A 1×N or
    /// N×1 raster degenerates to sampling its single row/column.
    pub fn sample(&self, u: f32, v: f32) -> f32 {
        let width = self.raster.width();
        let height = self.raster.height();

        let px = (u * (width - 1) as f32).round().clamp(0.0, (width - 1) as f32) as u32;
        let py = (v * (height - 1) as f32)
            .round()
            .clamp(0.0, (height - 1) as f32) as u32;

        f32::from(self.raster.red_at(px, py)) / 255.0
    }
}
