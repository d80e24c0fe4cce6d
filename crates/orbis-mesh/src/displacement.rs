//! Heightmap vertex displacement for sphere geometry.
//!
//! Each vertex samples the height field at its UV and moves radially outward
//! by scaling its undisplaced position: `p' = p + p * (sample * scale)`,
//! applied per component. The offset follows the position vector, not the
//! smoothed vertex normal — changing that changes the visible terrain shape.

use orbis_raster::HeightField;

use crate::sphere::SphereGeometry;

/// Errors that can occur applying displacement.
#[derive(Debug, thiserror::Error)]
pub enum DisplacementError {
    /// The requested scale is NaN or infinite and would poison the
    /// position buffer.
    #[error("displacement scale must be finite, got {0}")]
    NonFiniteScale(f32),
}

/// Tracks the last applied displacement and owns the snapshot of the
/// undisplaced positions.
///
/// The snapshot is captured lazily on the first displacement and recaptured
/// only if the vertex count changes. It is never shared.
#[derive(Clone, Debug, Default)]
pub struct DisplacementState {
    applied_scale: f32,
    original: Option<Vec<[f32; 3]>>,
}

impl DisplacementState {
    /// Fresh state: nothing applied, no snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// The scale most recently applied to the geometry. 0 after [`reset`].
    pub fn applied_scale(&self) -> f32 {
        self.applied_scale
    }

    /// Returns `true` once the undisplaced snapshot has been captured.
    pub fn has_snapshot(&self) -> bool {
        self.original.is_some()
    }

    fn snapshot<'a>(&'a mut self, geometry: &SphereGeometry) -> &'a [[f32; 3]] {
        let stale = self
            .original
            .as_ref()
            .is_none_or(|o| o.len() != geometry.positions.len());
        if stale {
            self.original = Some(geometry.positions.clone());
        }
        self.original.as_deref().expect("snapshot just captured")
    }
}

/// Displace the sphere's vertices from the height field at the given scale.
///
/// Returns `Ok(false)` without touching the geometry when `scale` equals the
/// previously applied scale; the full O(vertex count) pass, normal
/// regeneration, and bounds update only run when the scale actually changed.
/// Displaced positions are always computed from the undisplaced snapshot, so
/// repeated applications of the same scale are bit-identical.
pub fn displace(
    geometry: &mut SphereGeometry,
    state: &mut DisplacementState,
    field: &HeightField,
    scale: f32,
) -> Result<bool, DisplacementError> {
    if !scale.is_finite() {
        return Err(DisplacementError::NonFiniteScale(scale));
    }
    if scale == state.applied_scale {
        return Ok(false);
    }

    let original = state.snapshot(geometry);
    for i in 0..geometry.positions.len() {
        let [u, v] = geometry.uvs[i];
        let factor = field.sample(u, v) * scale;
        let o = original[i];
        geometry.positions[i] = [
            o[0] + o[0] * factor,
            o[1] + o[1] * factor,
            o[2] + o[2] * factor,
        ];
    }

    geometry.generate_vertex_normals();
    geometry.mark_dirty();
    geometry.update_bounds();
    state.applied_scale = scale;
    Ok(true)
}

/// Restore the geometry to its undisplaced positions.
///
/// Used when the displacement source goes away (no source means effective
/// scale 0). Returns `false` if nothing was applied, so an undisplaced
/// sphere is never rewritten.
pub fn reset(geometry: &mut SphereGeometry, state: &mut DisplacementState) -> bool {
    if state.applied_scale == 0.0 {
        return false;
    }
    if let Some(original) = &state.original {
        geometry.positions.copy_from_slice(original);
        geometry.generate_vertex_normals();
        geometry.mark_dirty();
        geometry.update_bounds();
    }
    state.applied_scale = 0.0;
    true
}
