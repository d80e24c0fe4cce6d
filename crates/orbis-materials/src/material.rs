//! Material instances: texture bindings, PBR parameters, and the
//! count-specialized surface layer arrays.

use orbis_assets::TextureHandle;

use crate::shading::Shading;

/// A CPU-side material instance.
///
/// The surface material additionally carries the blend-layer texture arrays;
/// their lengths are stored explicitly because the shader variants downstream
/// are specialized per layer count and must be told how many maps to expect.
#[derive(Clone, Debug, Default)]
pub struct Material {
    /// Shading model.
    pub shading: Shading,
    /// Whether the material renders with alpha blending.
    pub transparent: bool,
    /// Whether the material writes depth. Overlay shells don't, so the
    /// surface below stays visible through transparent texels.
    pub depth_write: bool,
    /// Diffuse texture.
    pub diffuse: Option<TextureHandle>,
    /// Bump/height texture for surface shading.
    pub bump: Option<TextureHandle>,
    /// Roughness in `[0, 1]`, used by realistic shading.
    pub roughness: f32,
    /// Metalness in `[0, 1]`, used by realistic shading.
    pub metalness: f32,
    /// Emission intensity multiplier.
    pub emission_intensity: f32,
    layer_diffuse: Vec<TextureHandle>,
    layer_emissive: Vec<TextureHandle>,
}

impl Material {
    /// An opaque surface material with the given shading.
    pub fn surface(shading: Shading) -> Self {
        Self {
            shading,
            transparent: false,
            depth_write: true,
            roughness: 0.5,
            ..Self::default()
        }
    }

    /// A transparent overlay material with the given shading: alpha-blended,
    /// no depth writes.
    pub fn overlay(shading: Shading) -> Self {
        Self {
            shading,
            transparent: true,
            depth_write: false,
            ..Self::default()
        }
    }

    /// Replace the blend-layer texture arrays and their advertised counts.
    pub fn set_surface_layers(
        &mut self,
        diffuse: Vec<TextureHandle>,
        emissive: Vec<TextureHandle>,
    ) {
        self.layer_diffuse = diffuse;
        self.layer_emissive = emissive;
    }

    /// Diffuse blend-layer textures, in declaration order.
    pub fn layer_diffuse(&self) -> &[TextureHandle] {
        &self.layer_diffuse
    }

    /// Emissive blend-layer textures, in declaration order.
    pub fn layer_emissive(&self) -> &[TextureHandle] {
        &self.layer_emissive
    }

    /// Number of diffuse blend layers the shader must be specialized for.
    pub fn layer_diffuse_count(&self) -> usize {
        self.layer_diffuse.len()
    }

    /// Number of emissive blend layers the shader must be specialized for.
    pub fn layer_emissive_count(&self) -> usize {
        self.layer_emissive.len()
    }
}
