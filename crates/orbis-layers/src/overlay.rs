//! Overlay shells and their per-shell material cache.

use orbis_materials::{Material, Shading};
use rustc_hash::FxHashMap;

use crate::scene::{NodeId, SceneSet};

/// A cached overlay shell: a mesh node plus one material instance per
/// shading mode it has ever rendered with.
///
/// Materials are created lazily and kept for the life of the shell, so
/// toggling a layer between lambert and color shading swaps between the two
/// cached instances instead of reallocating.
#[derive(Debug)]
pub struct OverlayShell {
    /// The shell's mesh node.
    pub node: NodeId,
    /// Uniform scale applied to the shared overlay sphere geometry.
    pub radius: f32,
    active: Shading,
    lambert: Option<Material>,
    color: Option<Material>,
}

impl OverlayShell {
    fn new(node: NodeId) -> Self {
        Self {
            node,
            radius: 0.0,
            active: Shading::Lambert,
            lambert: None,
            color: None,
        }
    }

    /// Select the material for `shading`, creating it on first use.
    ///
    /// Overlays only know lambert and color; anything else lands on the
    /// lambert instance (the caller has already warned about it).
    pub fn material_mut(&mut self, shading: Shading) -> &mut Material {
        let resolved = match shading {
            Shading::Color => Shading::Color,
            _ => Shading::Lambert,
        };
        self.active = resolved;
        let slot = match resolved {
            Shading::Color => &mut self.color,
            _ => &mut self.lambert,
        };
        slot.get_or_insert_with(|| Material::overlay(resolved))
    }

    /// The material currently selected for rendering.
    pub fn active_material(&self) -> Option<&Material> {
        match self.active {
            Shading::Color => self.color.as_ref(),
            _ => self.lambert.as_ref(),
        }
    }

    /// The shading the shell currently renders with.
    pub fn active_shading(&self) -> Shading {
        self.active
    }

    /// How many material instances this shell has allocated so far.
    pub fn cached_material_count(&self) -> usize {
        usize::from(self.lambert.is_some()) + usize::from(self.color.is_some())
    }
}

/// Overlay shells keyed by layer id.
///
/// Entries are created on a layer id's first appearance and never removed;
/// a layer omitted from a later cycle merely loses scene membership.
#[derive(Debug, Default)]
pub struct OverlayCache {
    shells: FxHashMap<String, OverlayShell>,
}

impl OverlayCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the shell for a layer id, creating it (and its scene node)
    /// on first appearance.
    pub fn get_or_create(&mut self, id: &str, scene: &mut SceneSet) -> &mut OverlayShell {
        self.shells
            .entry(id.to_string())
            .or_insert_with(|| OverlayShell::new(scene.alloc()))
    }

    /// The shell for a layer id, if it has ever been declared.
    pub fn get(&self, id: &str) -> Option<&OverlayShell> {
        self.shells.get(id)
    }

    /// Number of cached shells.
    pub fn len(&self) -> usize {
        self.shells.len()
    }

    /// Whether no shells exist yet.
    pub fn is_empty(&self) -> bool {
        self.shells.is_empty()
    }

    /// Iterate over `(layer id, shell)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OverlayShell)> {
        self.shells.iter().map(|(id, shell)| (id.as_str(), shell))
    }
}
