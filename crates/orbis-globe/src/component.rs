//! Host-facing component lifecycle.

use orbis_model::GlobeConfig;

/// Lifecycle contract between the host render loop and a scene component.
///
/// The host calls `init` once, then `render`/`after_render` every cycle with
/// the current declarative config, and `dispose` when the component leaves
/// the scene. Implementations keep their real logic in plain services and
/// use these hooks only to drive them, so the core stays host independent.
pub trait SceneComponent {
    /// One-time setup: allocate geometry and attach root nodes.
    fn init(&mut self);

    /// Reconcile internal state against the current config.
    fn render(&mut self, config: &GlobeConfig);

    /// Runs after the host has drawn the frame.
    fn after_render(&mut self) {}

    /// Tear down scene membership and event listeners.
    fn dispose(&mut self);
}
