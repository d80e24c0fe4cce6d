//! Declarative globe configuration.
//!
//! Each render cycle consumes a [`GlobeConfig`] describing the desired surface:
//! shading, textures, displacement, layers, camera ranges, and lighting.
//! Configs persist to disk as RON files and deserialize forward-compatibly
//! (missing fields fall back to defaults, unknown fields are ignored).

mod config;
mod error;

pub use config::{
    BlendTarget, EmissionConfig, GlobeConfig, LayerConfig, LayerKind, LightConfig,
    MainLightConfig, RealisticMaterialConfig, TextureRef, ViewControlConfig,
};
pub use error::ModelError;
