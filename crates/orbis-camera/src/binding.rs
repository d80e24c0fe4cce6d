//! Binding between a camera, an orbit controller, and the outbound event
//! stream.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{Receiver, Sender, unbounded};
use glam::Vec3;
use orbis_model::ViewControlConfig;

use crate::controller::{Camera, ListenerId, OrbitController};

/// Outbound camera-change notification.
///
/// `distance` is relative to the globe surface (controller distance minus the
/// base radius), matching the view-control config's convention.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraUpdate {
    /// Rotation around the horizontal axis, degrees.
    pub alpha: f32,
    /// Rotation around the vertical axis, degrees.
    pub beta: f32,
    /// Distance above the globe surface.
    pub distance: f32,
    /// Identity of the component that emitted the event.
    pub source_id: String,
    /// Identity of the globe the camera belongs to.
    pub target_id: String,
}

/// Attaches a camera to an orbit controller and republishes controller
/// updates as [`CameraUpdate`] events.
///
/// The binding holds at most one listener: rebinding detaches the previous
/// one before registering again, so repeated rebinds never duplicate event
/// delivery or leave a listener pointing at a discarded camera. A listener
/// registered on a controller the binding no longer has access to (the
/// controller itself was replaced) cannot be removed from it, so each
/// listener also carries the bind generation it was registered under and
/// falls silent once superseded.
pub struct CameraBinding {
    source_id: String,
    camera: Option<Camera>,
    listener: Option<ListenerId>,
    bind_generation: Arc<AtomicU64>,
    events_tx: Sender<CameraUpdate>,
    events_rx: Receiver<CameraUpdate>,
}

impl CameraBinding {
    /// Create an unbound binding. `source_id` tags every outbound event.
    pub fn new(source_id: impl Into<String>) -> Self {
        let (events_tx, events_rx) = unbounded();
        Self {
            source_id: source_id.into(),
            camera: None,
            listener: None,
            bind_generation: Arc::new(AtomicU64::new(0)),
            events_tx,
            events_rx,
        }
    }

    /// Bind a camera to the controller and apply the view-control config
    /// offset by `base_radius`.
    ///
    /// Any previously registered listener is detached first; after this call
    /// the controller carries exactly one listener owned by this binding.
    pub fn bind(
        &mut self,
        camera: Camera,
        controller: &mut OrbitController,
        view: &ViewControlConfig,
        base_radius: f32,
        target_id: &str,
    ) {
        self.detach(controller);

        controller.apply_view_control(view, base_radius);

        let events = self.events_tx.clone();
        let source_id = self.source_id.clone();
        let target_id = target_id.to_string();
        let current = Arc::clone(&self.bind_generation);
        let generation = current.fetch_add(1, Ordering::Relaxed) + 1;
        self.listener = Some(controller.on_update(Box::new(move |update| {
            if current.load(Ordering::Relaxed) != generation {
                // Superseded by a later bind; stay silent.
                return;
            }
            let _ = events.send(CameraUpdate {
                alpha: update.alpha,
                beta: update.beta,
                distance: update.distance - base_radius,
                source_id: source_id.clone(),
                target_id: target_id.clone(),
            });
        })));

        let mut camera = camera;
        controller.update_camera(&mut camera, Vec3::ZERO);
        self.camera = Some(camera);
    }

    /// Detach the listener and drop the camera.
    pub fn unbind(&mut self, controller: &mut OrbitController) {
        self.detach(controller);
        self.bind_generation.fetch_add(1, Ordering::Relaxed);
        self.camera = None;
    }

    /// Refresh the bound camera's pose from the controller.
    pub fn sync_camera(&mut self, controller: &OrbitController) {
        if let Some(camera) = &mut self.camera {
            controller.update_camera(camera, Vec3::ZERO);
        }
    }

    /// The bound camera, if any.
    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    /// Returns `true` while a listener is registered.
    pub fn is_bound(&self) -> bool {
        self.listener.is_some()
    }

    /// Drain outbound events accumulated since the last poll.
    pub fn poll_events(&self) -> Vec<CameraUpdate> {
        let mut events = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn detach(&mut self, controller: &mut OrbitController) {
        if let Some(id) = self.listener.take() {
            controller.off_update(id);
        }
    }
}
