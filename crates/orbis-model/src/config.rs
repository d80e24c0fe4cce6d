//! Globe configuration structs with sensible defaults and RON persistence.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Reference to a texture source: a path/URL string, or absent.
///
/// The empty string and the literal `"none"` both mean "no texture", matching
/// the loose source notation accepted by declarative scene descriptions.
/// Pre-decoded in-memory rasters are referenced the same way: the host
/// registers the raster with the asset loader under a key and names that key
/// here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TextureRef(pub String);

impl TextureRef {
    /// A reference pointing at nothing.
    pub fn none() -> Self {
        Self(String::new())
    }

    /// Create a reference from a path, URL, or loader key.
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    /// Returns `true` if this reference names no texture.
    pub fn is_none(&self) -> bool {
        self.0.is_empty() || self.0 == "none"
    }

    /// The loader key for this reference, or `None` if it names no texture.
    pub fn key(&self) -> Option<&str> {
        if self.is_none() { None } else { Some(&self.0) }
    }
}

impl From<&str> for TextureRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Top-level declarative globe configuration, consumed once per render cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GlobeConfig {
    /// Identity of this globe, carried on outbound camera events.
    pub id: String,
    /// Surface shading mode: `"lambert"`, `"color"`, or `"realistic"`.
    /// Unknown values fall back to lambert with a warning.
    pub shading: String,
    /// Base surface texture (diffuse).
    pub base_texture: TextureRef,
    /// Height texture, used as the surface bump map and as the default
    /// displacement source.
    pub height_texture: TextureRef,
    /// Displacement source. Overrides `height_texture` when set.
    pub displacement_texture: TextureRef,
    /// Unitless multiplier for vertex displacement. 0 disables displacement.
    pub displacement_scale: f32,
    /// Surface layers, in declaration order. Order determines overlay radius
    /// stacking and blend-texture array ordering.
    pub layers: Vec<LayerConfig>,
    /// Orbit camera configuration.
    pub view_control: ViewControlConfig,
    /// Lighting configuration.
    pub light: LightConfig,
    /// Extra material parameters applied when `shading` is `"realistic"`.
    pub realistic_material: RealisticMaterialConfig,
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            id: "globe".to_string(),
            shading: "lambert".to_string(),
            base_texture: TextureRef::none(),
            height_texture: TextureRef::none(),
            displacement_texture: TextureRef::none(),
            displacement_scale: 0.0,
            layers: Vec::new(),
            view_control: ViewControlConfig::default(),
            light: LightConfig::default(),
            realistic_material: RealisticMaterialConfig::default(),
        }
    }
}

impl GlobeConfig {
    /// The effective displacement source: `displacement_texture` when set,
    /// otherwise `height_texture`.
    pub fn displacement_source(&self) -> &TextureRef {
        if self.displacement_texture.is_none() {
            &self.height_texture
        } else {
            &self.displacement_texture
        }
    }
}

/// How a layer combines with the globe surface.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    /// Merged into the base surface's multi-layer texture arrays.
    Blend,
    /// Rendered as a separate concentric shell above the surface.
    #[default]
    Overlay,
}

/// Which surface channel a blend layer accumulates into.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BlendTarget {
    /// Diffuse accumulation (the default).
    #[default]
    Albedo,
    /// Emissive accumulation.
    Emission,
}

/// A single declared surface layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayerConfig {
    /// Stable identity. Overlay shells are cached by this id across cycles.
    pub id: String,
    /// Blend into the surface or float above it as a shell.
    #[serde(rename = "type")]
    pub kind: LayerKind,
    /// The layer's texture.
    pub texture: TextureRef,
    /// Target channel for blend layers. Ignored for overlays.
    pub blend_to: BlendTarget,
    /// Shading for overlay shells: `"lambert"` or `"color"`. Ignored for
    /// blend layers. Unknown values fall back to lambert with a warning.
    pub shading: String,
    /// Radial distance from the previous shell (or the surface, for the
    /// first overlay). `None` means one hundredth of the base radius.
    pub distance: Option<f32>,
    /// Whether the shell participates in the scene this cycle.
    pub show: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            kind: LayerKind::Overlay,
            texture: TextureRef::none(),
            blend_to: BlendTarget::Albedo,
            shading: "lambert".to_string(),
            distance: None,
            show: true,
        }
    }
}

/// Orbit camera ranges, damping, and initial pose.
///
/// `distance` values are relative to the target surface radius, so a config
/// keeps meaning the same thing when the globe is built at a different scale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewControlConfig {
    /// Initial rotation around the horizontal axis, degrees.
    pub alpha: f32,
    /// Initial rotation around the vertical axis, degrees.
    pub beta: f32,
    /// Initial distance above the surface.
    pub distance: f32,
    /// Minimum alpha, degrees.
    pub min_alpha: f32,
    /// Maximum alpha, degrees.
    pub max_alpha: f32,
    /// Minimum beta, degrees.
    pub min_beta: f32,
    /// Maximum beta, degrees.
    pub max_beta: f32,
    /// Minimum distance above the surface.
    pub min_distance: f32,
    /// Maximum distance above the surface.
    pub max_distance: f32,
    /// Rotation/zoom inertia factor in `[0, 1)`. 0 disables damping.
    pub damping: f32,
}

impl Default for ViewControlConfig {
    fn default() -> Self {
        Self {
            alpha: 30.0,
            beta: 0.0,
            distance: 150.0,
            min_alpha: -90.0,
            max_alpha: 90.0,
            min_beta: -180.0,
            max_beta: 180.0,
            min_distance: 40.0,
            max_distance: 400.0,
            damping: 0.8,
        }
    }
}

/// Lighting configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LightConfig {
    /// Main (sun) light.
    pub main: MainLightConfig,
    /// Surface self-illumination.
    pub emission: EmissionConfig,
}

/// Main light configuration. The sun is positioned from a point in time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MainLightConfig {
    /// RFC 3339 timestamp the sun position is computed for.
    /// Empty means "now".
    pub time: String,
}

/// Surface emission configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmissionConfig {
    /// Emission intensity multiplier for the surface material.
    pub intensity: f32,
}

impl Default for EmissionConfig {
    fn default() -> Self {
        Self { intensity: 1.0 }
    }
}

/// Material parameters for the `"realistic"` shading mode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RealisticMaterialConfig {
    /// Surface roughness in `[0, 1]`.
    pub roughness: f32,
    /// Metalness in `[0, 1]`.
    pub metalness: f32,
}

impl Default for RealisticMaterialConfig {
    fn default() -> Self {
        Self {
            roughness: 0.5,
            metalness: 0.0,
        }
    }
}

// --- Load / Save ---

impl GlobeConfig {
    /// Load a config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ModelError> {
        let config_path = config_dir.join("globe.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ModelError::ReadError)?;
            let config: GlobeConfig = ron::from_str(&contents).map_err(ModelError::ParseError)?;
            tracing::info!("loaded globe config from {}", config_path.display());
            Ok(config)
        } else {
            let config = GlobeConfig::default();
            config.save(config_dir)?;
            tracing::info!("created default globe config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save the config to the given directory as `globe.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ModelError> {
        std::fs::create_dir_all(config_dir).map_err(ModelError::WriteError)?;

        let config_path = config_dir.join("globe.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ModelError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ModelError::WriteError)?;
        Ok(())
    }
}
