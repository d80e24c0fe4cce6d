//! Per-cycle layer reconciliation.

use orbis_assets::{LoadState, RasterLoader, Texture, TextureHandle, TextureOptions};
use orbis_materials::Shading;
use orbis_model::{BlendTarget, LayerConfig, LayerKind};

use crate::overlay::OverlayCache;
use crate::scene::SceneSet;

/// Blend-layer texture arrays produced by reconciliation, in declaration
/// order. The surface material is handed both lists so its shader variants
/// can be specialized to the per-channel counts.
#[derive(Debug, Default)]
pub struct SurfaceLayers {
    /// Diffuse accumulation list.
    pub diffuse: Vec<TextureHandle>,
    /// Emissive accumulation list.
    pub emissive: Vec<TextureHandle>,
}

/// Reconcile declared layers against the overlay cache and scene.
///
/// Descriptors process in declaration order; the order fixes both the
/// blend-array positions and the overlay radius stacking. Each overlay shell
/// gets the transparent placeholder immediately, so it never flashes stale
/// pixels while its real texture decodes; a texture that fails to load
/// leaves the shell in place showing the placeholder.
pub fn reconcile(
    layers: &[LayerConfig],
    base_radius: f32,
    cache: &mut OverlayCache,
    scene: &mut SceneSet,
    loader: &RasterLoader,
    placeholder: &TextureHandle,
) -> SurfaceLayers {
    let mut surface = SurfaceLayers::default();
    let mut previous_radius = base_radius;

    for layer in layers {
        match layer.kind {
            LayerKind::Blend => {
                let texture = resolve_texture(layer, loader, placeholder);
                match layer.blend_to {
                    BlendTarget::Albedo => surface.diffuse.push(texture),
                    BlendTarget::Emission => surface.emissive.push(texture),
                }
            }
            LayerKind::Overlay => {
                if layer.id.is_empty() {
                    tracing::warn!("overlay layer without id is skipped");
                    continue;
                }

                let shading = overlay_shading(layer);
                let shell = cache.get_or_create(&layer.id, scene);
                let material = shell.material_mut(shading);

                // Placeholder first so the shell is transparent rather than
                // opaque or stale while the real texture is in flight.
                material.diffuse = Some(placeholder.clone());
                if let Some(key) = layer.texture.key()
                    && let LoadState::Ready(raster) = loader.request(key)
                {
                    material.diffuse = Some(Texture::new(raster, TextureOptions::default()));
                }

                let step = layer.distance.unwrap_or(base_radius / 100.0);
                let radius = previous_radius + step;
                shell.radius = radius;
                previous_radius = radius;

                if layer.show {
                    scene.add(shell.node);
                } else {
                    scene.remove(shell.node);
                }
            }
        }
    }

    surface
}

/// Resolve a blend layer's texture, or the placeholder while it loads.
fn resolve_texture(
    layer: &LayerConfig,
    loader: &RasterLoader,
    placeholder: &TextureHandle,
) -> TextureHandle {
    let Some(key) = layer.texture.key() else {
        return placeholder.clone();
    };
    match loader.request(key) {
        LoadState::Ready(raster) => Texture::new(raster, TextureOptions::default()),
        LoadState::Pending | LoadState::Failed => placeholder.clone(),
    }
}

/// Overlay shading with the lambert fallback for anything unknown.
fn overlay_shading(layer: &LayerConfig) -> Shading {
    match Shading::parse(&layer.shading) {
        Some(Shading::Lambert) => Shading::Lambert,
        Some(Shading::Color) => Shading::Color,
        _ => {
            tracing::warn!(
                "layer \"{}\": unknown overlay shading \"{}\", falling back to lambert",
                layer.id,
                layer.shading
            );
            Shading::Lambert
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbis_model::TextureRef;
    use orbis_raster::Raster;
    use std::sync::Arc;

    fn overlay_layer(id: &str, distance: Option<f32>) -> LayerConfig {
        LayerConfig {
            id: id.to_string(),
            kind: LayerKind::Overlay,
            distance,
            ..Default::default()
        }
    }

    struct Fixture {
        cache: OverlayCache,
        scene: SceneSet,
        loader: RasterLoader,
        placeholder: TextureHandle,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                cache: OverlayCache::new(),
                scene: SceneSet::new(),
                loader: RasterLoader::new(1, 8),
                placeholder: Texture::transparent(),
            }
        }

        fn reconcile(&mut self, layers: &[LayerConfig], base_radius: f32) -> SurfaceLayers {
            reconcile(
                layers,
                base_radius,
                &mut self.cache,
                &mut self.scene,
                &self.loader,
                &self.placeholder,
            )
        }

        fn insert_raster(&self, key: &str, red: u8) {
            let raster = Arc::new(Raster::solid(2, 2, [red, 0, 0, 255]).unwrap());
            self.loader.insert_memory(key, raster);
        }
    }

    #[test]
    fn test_radius_stacking_with_default_and_explicit_distance() {
        let mut fx = Fixture::new();
        let layers = [
            overlay_layer("inner", None),
            overlay_layer("outer", Some(5.0)),
        ];
        fx.reconcile(&layers, 100.0);

        // Default step is base_radius / 100; the second shell stacks on the
        // first: 100 + 1 = 101, then 101 + 5 = 106.
        assert_eq!(fx.cache.get("inner").unwrap().radius, 101.0);
        assert_eq!(fx.cache.get("outer").unwrap().radius, 106.0);
    }

    #[test]
    fn test_radius_stack_recomputed_every_cycle() {
        let mut fx = Fixture::new();
        fx.reconcile(&[overlay_layer("a", Some(2.0))], 100.0);
        assert_eq!(fx.cache.get("a").unwrap().radius, 102.0);

        // Same layer declared after a new first shell: its radius moves.
        let layers = [overlay_layer("b", Some(1.0)), overlay_layer("a", Some(2.0))];
        fx.reconcile(&layers, 100.0);
        assert_eq!(fx.cache.get("b").unwrap().radius, 101.0);
        assert_eq!(fx.cache.get("a").unwrap().radius, 103.0);
    }

    #[test]
    fn test_non_positive_distance_is_allowed() {
        let mut fx = Fixture::new();
        let layers = [
            overlay_layer("a", Some(0.0)),
            overlay_layer("b", Some(-3.0)),
        ];
        fx.reconcile(&layers, 100.0);
        assert_eq!(fx.cache.get("a").unwrap().radius, 100.0);
        assert_eq!(fx.cache.get("b").unwrap().radius, 97.0);
    }

    #[test]
    fn test_blend_layers_route_by_target() {
        let mut fx = Fixture::new();
        fx.insert_raster("day.png", 10);
        fx.insert_raster("night.png", 20);

        let layers = [
            LayerConfig {
                id: "day".into(),
                kind: LayerKind::Blend,
                texture: TextureRef::new("day.png"),
                blend_to: BlendTarget::Albedo,
                ..Default::default()
            },
            LayerConfig {
                id: "night".into(),
                kind: LayerKind::Blend,
                texture: TextureRef::new("night.png"),
                blend_to: BlendTarget::Emission,
                ..Default::default()
            },
        ];
        let surface = fx.reconcile(&layers, 100.0);

        assert_eq!(surface.diffuse.len(), 1);
        assert_eq!(surface.emissive.len(), 1);
        assert_eq!(surface.diffuse[0].raster.red_at(0, 0), 10);
        assert_eq!(surface.emissive[0].raster.red_at(0, 0), 20);
        assert!(fx.cache.is_empty(), "blend layers create no shells");
    }

    #[test]
    fn test_pending_blend_texture_keeps_array_position() {
        let mut fx = Fixture::new();
        let layers = [LayerConfig {
            id: "slow".into(),
            kind: LayerKind::Blend,
            texture: TextureRef::new("/nonexistent/slow.png"),
            ..Default::default()
        }];
        let surface = fx.reconcile(&layers, 100.0);

        // The array slot exists immediately so shader counts stay stable;
        // pixels are the transparent placeholder until the load lands.
        assert_eq!(surface.diffuse.len(), 1);
        assert!(surface.diffuse[0].is_fully_transparent());
    }

    #[test]
    fn test_overlay_gets_placeholder_then_loaded_texture() {
        let mut fx = Fixture::new();
        let mut layer = overlay_layer("clouds", None);
        layer.texture = TextureRef::new("clouds.png");

        // First cycle: texture not yet decoded anywhere.
        fx.reconcile(std::slice::from_ref(&layer), 100.0);
        let shell = fx.cache.get("clouds").unwrap();
        assert!(
            shell
                .active_material()
                .unwrap()
                .diffuse
                .as_ref()
                .unwrap()
                .is_fully_transparent()
        );

        // The decode lands; the next cycle swaps the real texture in.
        fx.insert_raster("clouds.png", 42);
        fx.reconcile(&[layer], 100.0);
        let shell = fx.cache.get("clouds").unwrap();
        assert_eq!(
            shell
                .active_material()
                .unwrap()
                .diffuse
                .as_ref()
                .unwrap()
                .raster
                .red_at(0, 0),
            42
        );
    }

    #[test]
    fn test_failed_texture_keeps_shell_with_placeholder() {
        let mut fx = Fixture::new();
        let mut layer = overlay_layer("broken", None);
        layer.texture = TextureRef::new("/nonexistent/broken.png");

        fx.reconcile(std::slice::from_ref(&layer), 100.0);
        // Let the worker fail the load, then fold the failure in.
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while fx.loader.drain().is_empty() && std::time::Instant::now() < deadline {
            std::thread::sleep(std::time::Duration::from_millis(5));
        }

        fx.reconcile(&[layer], 100.0);
        let shell = fx.cache.get("broken").expect("shell stays cached");
        assert!(fx.scene.contains(shell.node), "shell stays visible");
        assert!(
            shell
                .active_material()
                .unwrap()
                .diffuse
                .as_ref()
                .unwrap()
                .is_fully_transparent(),
            "failed load leaves the placeholder in place"
        );
    }

    #[test]
    fn test_show_flag_toggles_scene_membership() {
        let mut fx = Fixture::new();
        let mut layer = overlay_layer("clouds", None);
        fx.reconcile(std::slice::from_ref(&layer), 100.0);
        let node = fx.cache.get("clouds").unwrap().node;
        assert!(fx.scene.contains(node));

        layer.show = false;
        fx.reconcile(std::slice::from_ref(&layer), 100.0);
        assert!(!fx.scene.contains(node));
        assert_eq!(fx.cache.len(), 1, "hidden shells stay cached");

        layer.show = true;
        fx.reconcile(&[layer], 100.0);
        assert!(fx.scene.contains(node));
    }

    #[test]
    fn test_omitted_layer_keeps_cache_entry() {
        let mut fx = Fixture::new();
        fx.reconcile(&[overlay_layer("transient", None)], 100.0);
        assert_eq!(fx.cache.len(), 1);

        // Declared layers drop to zero; the cache never shrinks.
        fx.reconcile(&[], 100.0);
        assert_eq!(fx.cache.len(), 1);
    }

    #[test]
    fn test_shading_toggle_reuses_cached_materials() {
        let mut fx = Fixture::new();
        let mut layer = overlay_layer("clouds", None);

        for cycle in 0..6 {
            layer.shading = if cycle % 2 == 0 { "lambert" } else { "color" }.to_string();
            fx.reconcile(std::slice::from_ref(&layer), 100.0);
        }
        let shell = fx.cache.get("clouds").unwrap();
        assert_eq!(
            shell.cached_material_count(),
            2,
            "repeated toggles must not allocate new materials"
        );
    }

    #[test]
    fn test_unknown_overlay_shading_falls_back_to_lambert() {
        let mut fx = Fixture::new();
        let mut layer = overlay_layer("weird", None);
        layer.shading = "phong".to_string();
        fx.reconcile(&[layer], 100.0);
        assert_eq!(
            fx.cache.get("weird").unwrap().active_shading(),
            Shading::Lambert
        );
    }

    #[test]
    fn test_layer_without_id_is_skipped() {
        let mut fx = Fixture::new();
        let layers = [overlay_layer("", None), overlay_layer("real", None)];
        fx.reconcile(&layers, 100.0);

        assert_eq!(fx.cache.len(), 1);
        // The skipped layer does not advance the radius stack.
        assert_eq!(fx.cache.get("real").unwrap().radius, 101.0);
    }
}
