//! The globe surface: orchestrates displacement, layers, lighting, and the
//! camera binding for each render cycle.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec3;
use rustc_hash::FxHashMap;

use orbis_assets::{LoadState, RasterLoader, Texture, TextureHandle, TextureOptions};
use orbis_camera::{Camera, CameraBinding, CameraUpdate, OrbitController};
use orbis_layers::{NodeId, OverlayCache, SceneSet, reconcile};
use orbis_lighting::{EquinoxSun, MainLight, SunEphemeris, resolve_timestamp_ms};
use orbis_materials::{Material, Shading};
use orbis_mesh::{DisplacementState, SphereGeometry};
use orbis_model::GlobeConfig;
use orbis_raster::HeightField;

use crate::component::SceneComponent;

static NEXT_SURFACE_UID: AtomicU64 = AtomicU64::new(1);

/// Segment counts for the displaceable base sphere.
const EARTH_SEGMENTS: (u32, u32) = (200, 100);
/// Segment counts for the shared overlay shell sphere.
const OVERLAY_SEGMENTS: (u32, u32) = (80, 40);

/// A displacement request whose source raster is still decoding.
struct PendingDisplacement {
    key: String,
    scale: f32,
    generation: u64,
}

/// The globe surface aggregate.
///
/// Owns the base sphere geometry, the cached undisplaced positions, the
/// per-shading surface materials, the overlay shell cache, the raster
/// loader, and the camera binding. All mutation happens on the render
/// thread; the only asynchrony is raster decoding, folded back in at the
/// start of each cycle.
pub struct GlobeSurface {
    uid: String,
    base_radius: f32,
    scene: SceneSet,
    earth_node: NodeId,
    sphere: SphereGeometry,
    overlay_sphere: SphereGeometry,
    materials: FxHashMap<Shading, Material>,
    active_shading: Shading,
    displacement: DisplacementState,
    requested_scale: f32,
    pending_displacement: Option<PendingDisplacement>,
    displacement_generation: u64,
    overlays: OverlayCache,
    loader: RasterLoader,
    placeholder: OnceLock<TextureHandle>,
    controller: OrbitController,
    binding: CameraBinding,
    ephemeris: Box<dyn SunEphemeris>,
    main_light: MainLight,
    needs_redraw: bool,
    initialized: bool,
}

impl GlobeSurface {
    /// Build a globe of the given radius with the default loader and the
    /// built-in sun model.
    pub fn new(base_radius: f32) -> Self {
        Self::with_parts(base_radius, RasterLoader::with_defaults(), Box::new(EquinoxSun))
    }

    /// Build a globe with an explicit loader and ephemeris.
    pub fn with_parts(
        base_radius: f32,
        loader: RasterLoader,
        ephemeris: Box<dyn SunEphemeris>,
    ) -> Self {
        let uid = format!(
            "globe-surface-{}",
            NEXT_SURFACE_UID.fetch_add(1, Ordering::Relaxed)
        );
        let mut scene = SceneSet::new();
        let earth_node = scene.alloc();

        let mut materials = FxHashMap::default();
        for shading in [Shading::Lambert, Shading::Color, Shading::Realistic] {
            materials.insert(shading, Material::surface(shading));
        }

        let binding = CameraBinding::new(uid.clone());

        Self {
            uid,
            base_radius,
            scene,
            earth_node,
            sphere: SphereGeometry::new(EARTH_SEGMENTS.0, EARTH_SEGMENTS.1),
            overlay_sphere: SphereGeometry::new(OVERLAY_SEGMENTS.0, OVERLAY_SEGMENTS.1),
            materials,
            active_shading: Shading::Lambert,
            displacement: DisplacementState::new(),
            requested_scale: 0.0,
            pending_displacement: None,
            displacement_generation: 0,
            overlays: OverlayCache::new(),
            loader,
            placeholder: OnceLock::new(),
            controller: OrbitController::new(),
            binding,
            ephemeris,
            main_light: MainLight::new(),
            needs_redraw: false,
            initialized: false,
        }
    }

    /// This component's identity, carried as `source_id` on outbound camera
    /// events.
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// The globe's radius in world units; the base sphere is unit sized and
    /// scaled by this at draw time.
    pub fn base_radius(&self) -> f32 {
        self.base_radius
    }

    /// The base sphere geometry.
    pub fn geometry(&self) -> &SphereGeometry {
        &self.sphere
    }

    /// The base sphere geometry, for the host's upload pass.
    pub fn geometry_mut(&mut self) -> &mut SphereGeometry {
        &mut self.sphere
    }

    /// The shared geometry all overlay shells scale from.
    pub fn overlay_geometry(&self) -> &SphereGeometry {
        &self.overlay_sphere
    }

    /// Scene membership of the globe's nodes.
    pub fn scene(&self) -> &SceneSet {
        &self.scene
    }

    /// The earth mesh's scene node.
    pub fn earth_node(&self) -> NodeId {
        self.earth_node
    }

    /// Cached overlay shells.
    pub fn overlays(&self) -> &OverlayCache {
        &self.overlays
    }

    /// The raster loader; hosts use it to register in-memory rasters.
    pub fn loader(&self) -> &RasterLoader {
        &self.loader
    }

    /// The surface material currently selected for the base sphere.
    pub fn surface_material(&self) -> &Material {
        &self.materials[&self.active_shading]
    }

    /// The orbit controller driving the bound camera.
    pub fn controller(&self) -> &OrbitController {
        &self.controller
    }

    /// Interactive access to the controller (rotation, zoom).
    pub fn controller_mut(&mut self) -> &mut OrbitController {
        &mut self.controller
    }

    /// The bound camera, if a render cycle has run.
    pub fn camera(&self) -> Option<&Camera> {
        self.binding.camera()
    }

    /// The main (sun) light.
    pub fn main_light(&self) -> MainLight {
        self.main_light
    }

    /// Drain outbound camera-change events accumulated since the last poll.
    pub fn poll_camera_events(&self) -> Vec<CameraUpdate> {
        self.binding.poll_events()
    }

    /// Returns and clears the redraw request raised by async completions.
    pub fn take_needs_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    /// The shared fully-transparent placeholder texture, created once.
    fn placeholder(&self) -> TextureHandle {
        self.placeholder.get_or_init(Texture::transparent).clone()
    }

    /// Fold completed raster loads back into live state.
    ///
    /// Drained results are already in the loader's cache; everything that
    /// consumes them (materials, shells, displacement) resolves by key
    /// against the *current* caches, never against a snapshot captured when
    /// the load started. Any completion requests a redraw so the host
    /// re-renders with the new pixels.
    fn pump_loader(&mut self) {
        if !self.loader.drain().is_empty() {
            self.needs_redraw = true;
        }
        self.try_complete_displacement();
    }

    /// Apply a pending displacement request once its source raster exists.
    ///
    /// Only the newest request ever applies: issuing a new one overwrites
    /// the pending slot and bumps the generation, so a superseded request
    /// can never displace the sphere with stale parameters.
    fn try_complete_displacement(&mut self) {
        let Some(pending) = self.pending_displacement.take() else {
            return;
        };
        if pending.generation != self.displacement_generation {
            return;
        }
        match self.loader.request(&pending.key) {
            LoadState::Ready(raster) => {
                let field = HeightField::new(raster);
                if let Err(err) = orbis_mesh::displace(
                    &mut self.sphere,
                    &mut self.displacement,
                    &field,
                    pending.scale,
                ) {
                    tracing::warn!("displacement after load failed: {err}; leaving surface flat");
                    orbis_mesh::reset(&mut self.sphere, &mut self.displacement);
                }
            }
            LoadState::Pending => self.pending_displacement = Some(pending),
            LoadState::Failed => {
                // A bad heightmap degrades to a flat surface.
                orbis_mesh::reset(&mut self.sphere, &mut self.displacement);
            }
        }
    }

    fn update_materials(&mut self, config: &GlobeConfig) {
        self.active_shading = Shading::parse_or_lambert(&config.shading);

        let placeholder = self.placeholder();
        let base = self.resolve_texture(&config.base_texture);
        let bump = self.resolve_texture(&config.height_texture);

        let material = self
            .materials
            .get_mut(&self.active_shading)
            .expect("all shading modes have a material");

        if self.active_shading == Shading::Realistic {
            material.roughness = config.realistic_material.roughness.clamp(0.0, 1.0);
            material.metalness = config.realistic_material.metalness.clamp(0.0, 1.0);
        }

        match base {
            Some(texture) => material.diffuse = Some(texture),
            // Keep the previous texture while a load is in flight; a globe
            // that had pixels should not blank out mid-flight.
            None if material.diffuse.is_none() => material.diffuse = Some(placeholder),
            None => {}
        }
        material.bump = bump.or(material.bump.take());

        material.emission_intensity = config.light.emission.intensity;
    }

    /// Resolve a texture reference to a ready texture, or `None` while it
    /// loads (or after it failed).
    fn resolve_texture(&self, texture: &orbis_model::TextureRef) -> Option<TextureHandle> {
        let key = texture.key()?;
        match self.loader.request(key) {
            LoadState::Ready(raster) => Some(Texture::new(raster, TextureOptions::default())),
            LoadState::Pending | LoadState::Failed => None,
        }
    }

    fn update_light(&mut self, config: &GlobeConfig) {
        let timestamp = resolve_timestamp_ms(&config.light.main.time);
        let sun = self.ephemeris.position(timestamp);
        self.main_light.update(sun, Vec3::ZERO);
    }

    /// Drive displacement from the config.
    ///
    /// The cycle-over-cycle diff is on the requested scale alone: re-sending
    /// the same scale is a guaranteed no-op, including while a source image
    /// is still decoding. No source (or a failed one) means scale 0.
    fn update_displacement(&mut self, config: &GlobeConfig) {
        let source = config.displacement_source();
        let mut scale = if source.is_none() {
            0.0
        } else {
            config.displacement_scale
        };
        if !scale.is_finite() {
            tracing::warn!("non-finite displacement scale {scale}, treating as 0");
            scale = 0.0;
        }

        if scale == self.requested_scale {
            return;
        }
        self.requested_scale = scale;

        let Some(key) = source.key().filter(|_| scale != 0.0) else {
            self.pending_displacement = None;
            orbis_mesh::reset(&mut self.sphere, &mut self.displacement);
            return;
        };

        match self.loader.request(key) {
            LoadState::Ready(raster) => {
                self.pending_displacement = None;
                let field = HeightField::new(raster);
                if let Err(err) =
                    orbis_mesh::displace(&mut self.sphere, &mut self.displacement, &field, scale)
                {
                    tracing::warn!("displacement failed: {err}; leaving surface flat");
                    orbis_mesh::reset(&mut self.sphere, &mut self.displacement);
                }
            }
            LoadState::Pending => {
                self.displacement_generation += 1;
                self.pending_displacement = Some(PendingDisplacement {
                    key: key.to_string(),
                    scale,
                    generation: self.displacement_generation,
                });
            }
            LoadState::Failed => {
                // A malformed or unreadable heightmap degrades to a flat
                // surface rather than aborting the cycle.
                self.pending_displacement = None;
                orbis_mesh::reset(&mut self.sphere, &mut self.displacement);
            }
        }
    }

    fn update_layers(&mut self, config: &GlobeConfig) {
        let placeholder = self.placeholder();
        let surface_layers = reconcile(
            &config.layers,
            self.base_radius,
            &mut self.overlays,
            &mut self.scene,
            &self.loader,
            &placeholder,
        );

        let material = self
            .materials
            .get_mut(&self.active_shading)
            .expect("all shading modes have a material");
        material.set_surface_layers(surface_layers.diffuse, surface_layers.emissive);
    }

    fn update_view_control(&mut self, config: &GlobeConfig) {
        let camera = self.binding.camera().copied().unwrap_or_default();
        self.binding.bind(
            camera,
            &mut self.controller,
            &config.view_control,
            self.base_radius,
            &config.id,
        );
    }
}

impl SceneComponent for GlobeSurface {
    fn init(&mut self) {
        if self.initialized {
            return;
        }
        self.scene.add(self.earth_node);
        self.initialized = true;
    }

    fn render(&mut self, config: &GlobeConfig) {
        self.init();

        self.pump_loader();
        self.update_materials(config);
        self.update_light(config);
        self.update_displacement(config);
        self.update_view_control(config);
        self.update_layers(config);
    }

    fn after_render(&mut self) {
        // Advance damped camera motion and keep the bound camera in step;
        // pose changes emit outbound events through the binding.
        self.controller.tick();
        self.binding.sync_camera(&self.controller);
    }

    fn dispose(&mut self) {
        self.scene.clear();
        self.binding.unbind(&mut self.controller);
        self.initialized = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbis_model::{LayerConfig, TextureRef};
    use orbis_raster::Raster;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    fn test_surface() -> GlobeSurface {
        GlobeSurface::with_parts(100.0, RasterLoader::new(1, 16), Box::new(EquinoxSun))
    }

    fn insert_height_raster(surface: &GlobeSurface, key: &str, red: u8) {
        let raster = Arc::new(Raster::solid(4, 4, [red, 0, 0, 255]).unwrap());
        surface.loader().insert_memory(key, raster);
    }

    fn wait_for_completions(surface: &GlobeSurface, n: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while surface.loader().completed_count() < n && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_init_attaches_earth_node() {
        let mut surface = test_surface();
        assert!(!surface.scene().contains(surface.earth_node()));
        surface.init();
        assert!(surface.scene().contains(surface.earth_node()));
    }

    #[test]
    fn test_render_selects_shading_with_fallback() {
        let mut surface = test_surface();
        let mut config = GlobeConfig::default();

        config.shading = "color".to_string();
        surface.render(&config);
        assert_eq!(surface.surface_material().shading, Shading::Color);

        config.shading = "cartoon".to_string();
        surface.render(&config);
        assert_eq!(
            surface.surface_material().shading,
            Shading::Lambert,
            "unknown shading falls back to lambert"
        );
    }

    #[test]
    fn test_realistic_material_parameters_applied() {
        let mut surface = test_surface();
        let mut config = GlobeConfig::default();
        config.shading = "realistic".to_string();
        config.realistic_material.roughness = 0.2;
        config.realistic_material.metalness = 0.9;

        surface.render(&config);
        let material = surface.surface_material();
        assert_eq!(material.roughness, 0.2);
        assert_eq!(material.metalness, 0.9);
    }

    #[test]
    fn test_emission_intensity_applied() {
        let mut surface = test_surface();
        let mut config = GlobeConfig::default();
        config.light.emission.intensity = 2.5;
        surface.render(&config);
        assert_eq!(surface.surface_material().emission_intensity, 2.5);
    }

    #[test]
    fn test_in_memory_displacement_applies_synchronously() {
        let mut surface = test_surface();
        insert_height_raster(&surface, "height", 255);

        let mut config = GlobeConfig::default();
        config.height_texture = TextureRef::new("height");
        config.displacement_scale = 0.5;
        surface.render(&config);

        let radius = glam::Vec3::from_array(surface.geometry().positions[0]).length();
        assert!(
            (radius - 1.5).abs() < 1e-4,
            "full-red heightmap at scale 0.5 should lift every vertex to 1.5"
        );
    }

    #[test]
    fn test_unchanged_scale_is_noop_across_cycles() {
        let mut surface = test_surface();
        insert_height_raster(&surface, "height", 200);

        let mut config = GlobeConfig::default();
        config.height_texture = TextureRef::new("height");
        config.displacement_scale = 0.3;
        surface.render(&config);
        let after_first = surface.geometry().positions.clone();
        surface.geometry_mut().take_dirty();

        surface.render(&config);
        assert_eq!(surface.geometry().positions, after_first);
        assert!(
            !surface.geometry().is_dirty(),
            "re-rendering with an unchanged scale must not touch geometry"
        );
    }

    #[test]
    fn test_scale_zero_restores_flat_sphere() {
        let mut surface = test_surface();
        insert_height_raster(&surface, "height", 255);
        let undisplaced = surface.geometry().positions.clone();

        let mut config = GlobeConfig::default();
        config.height_texture = TextureRef::new("height");
        config.displacement_scale = 0.5;
        surface.render(&config);
        assert_ne!(surface.geometry().positions, undisplaced);

        config.displacement_scale = 0.0;
        surface.render(&config);
        assert_eq!(surface.geometry().positions, undisplaced);
    }

    #[test]
    fn test_removing_source_restores_flat_sphere() {
        let mut surface = test_surface();
        insert_height_raster(&surface, "height", 255);
        let undisplaced = surface.geometry().positions.clone();

        let mut config = GlobeConfig::default();
        config.height_texture = TextureRef::new("height");
        config.displacement_scale = 0.5;
        surface.render(&config);

        config.height_texture = TextureRef::none();
        surface.render(&config);
        assert_eq!(surface.geometry().positions, undisplaced);
    }

    #[test]
    fn test_displacement_texture_overrides_height_texture() {
        let mut surface = test_surface();
        insert_height_raster(&surface, "height", 0);
        insert_height_raster(&surface, "displacement", 255);

        let mut config = GlobeConfig::default();
        config.height_texture = TextureRef::new("height");
        config.displacement_texture = TextureRef::new("displacement");
        config.displacement_scale = 1.0;
        surface.render(&config);

        let radius = glam::Vec3::from_array(surface.geometry().positions[0]).length();
        assert!(
            (radius - 2.0).abs() < 1e-4,
            "the dedicated displacement texture must win over the height texture"
        );
    }

    #[test]
    fn test_failed_displacement_source_degrades_to_flat() {
        let mut surface = test_surface();
        let undisplaced = surface.geometry().positions.clone();

        let mut config = GlobeConfig::default();
        config.height_texture = TextureRef::new("/nonexistent/height.png");
        config.displacement_scale = 0.5;
        surface.render(&config);

        // Let the decode fail, then fold the failure in on the next cycle.
        wait_for_completions(&surface, 1);
        surface.render(&config);
        assert_eq!(
            surface.geometry().positions, undisplaced,
            "a bad heightmap leaves the surface flat instead of crashing"
        );
    }

    #[test]
    fn test_superseded_displacement_request_is_ignored() {
        // A loader without workers keeps path loads pending until the raster
        // is registered by hand, so the supersede order is deterministic.
        let mut surface =
            GlobeSurface::with_parts(100.0, RasterLoader::new(0, 16), Box::new(EquinoxSun));

        let mut config = GlobeConfig::default();
        config.height_texture = TextureRef::new("late-height");
        config.displacement_scale = 0.5;
        surface.render(&config);

        // A newer request supersedes the first while both are unresolved.
        config.displacement_scale = 0.8;
        surface.render(&config);

        // The raster finally shows up; only the newest request applies.
        insert_height_raster(&surface, "late-height", 255);
        surface.render(&config);

        let radius = glam::Vec3::from_array(surface.geometry().positions[0]).length();
        assert!(
            (radius - 1.8).abs() < 1e-4,
            "the most recent scale (0.8) must win, got radius {radius}"
        );
    }

    #[test]
    fn test_layers_feed_surface_material_counts() {
        let mut surface = test_surface();
        insert_height_raster(&surface, "glow.png", 40);

        let mut config = GlobeConfig::default();
        config.layers = vec![
            LayerConfig {
                id: "glow".into(),
                kind: orbis_model::LayerKind::Blend,
                texture: TextureRef::new("glow.png"),
                blend_to: orbis_model::BlendTarget::Emission,
                ..Default::default()
            },
            LayerConfig {
                id: "clouds".into(),
                ..Default::default()
            },
        ];
        surface.render(&config);

        assert_eq!(surface.surface_material().layer_emissive_count(), 1);
        assert_eq!(surface.surface_material().layer_diffuse_count(), 0);
        assert_eq!(surface.overlays().len(), 1);
        let shell = surface.overlays().get("clouds").unwrap();
        assert_eq!(shell.radius, 101.0);
        assert!(surface.scene().contains(shell.node));
    }

    #[test]
    fn test_placeholder_is_a_shared_singleton() {
        let surface = test_surface();
        let a = surface.placeholder();
        let b = surface.placeholder();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.is_fully_transparent());
    }

    #[test]
    fn test_repeated_renders_keep_one_camera_listener() {
        let mut surface = test_surface();
        let mut config = GlobeConfig::default();
        config.view_control.damping = 0.0;
        surface.render(&config);
        surface.render(&config);
        surface.render(&config);
        assert_eq!(surface.controller().listener_count(), 1);

        surface.controller_mut().rotate(5.0, 0.0);
        assert_eq!(surface.poll_camera_events().len(), 1);
    }

    #[test]
    fn test_camera_events_carry_identities_and_relative_distance() {
        let mut surface = test_surface();
        let mut config = GlobeConfig::default();
        config.id = "earth".to_string();
        config.view_control.damping = 0.0;
        surface.render(&config);

        surface.controller_mut().zoom(10.0);
        let events = surface.poll_camera_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].target_id, "earth");
        assert!(events[0].source_id.starts_with("globe-surface-"));
        assert!((events[0].distance - 160.0).abs() < 1e-3);
    }

    #[test]
    fn test_light_time_positions_sun() {
        let mut surface = test_surface();
        let mut config = GlobeConfig::default();
        config.light.main.time = "1970-01-01T12:00:00Z".to_string();
        surface.render(&config);

        // Noon in the simplified ephemeris: sun on the +X axis.
        let light = surface.main_light();
        assert!((light.position.x - 1.0).abs() < 1e-4);
        assert_eq!(light.target, Vec3::ZERO);
    }

    #[test]
    fn test_dispose_clears_scene_and_listener() {
        let mut surface = test_surface();
        let mut config = GlobeConfig::default();
        config.layers = vec![LayerConfig {
            id: "clouds".into(),
            ..Default::default()
        }];
        surface.render(&config);
        assert!(!surface.scene().is_empty());

        surface.dispose();
        assert!(surface.scene().is_empty());
        assert_eq!(surface.controller().listener_count(), 0);

        surface.controller_mut().rotate(1.0, 0.0);
        assert!(surface.poll_camera_events().is_empty());
    }

    #[test]
    fn test_async_completion_requests_redraw() {
        let mut surface = test_surface();
        let mut config = GlobeConfig::default();
        config.base_texture = TextureRef::new("/nonexistent/base.png");
        surface.render(&config);
        let _ = surface.take_needs_redraw();

        wait_for_completions(&surface, 1);
        surface.render(&config);
        assert!(
            surface.take_needs_redraw(),
            "a drained completion (even a failure) must request a redraw"
        );
    }
}
