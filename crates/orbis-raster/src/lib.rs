//! Decoded raster images and height-field sampling.
//!
//! A [`Raster`] is an immutable RGBA8 pixel buffer decoded once per distinct
//! image. [`HeightField`] turns a raster into a displacement lookup by UV,
//! using nearest-pixel point sampling of the red channel.

mod height_field;
mod raster;

pub use height_field::HeightField;
pub use raster::{Raster, RasterError};
