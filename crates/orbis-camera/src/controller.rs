//! Orbit controller: damped alpha/beta/distance pose with update listeners.

use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec3;
use orbis_model::ViewControlConfig;

static NEXT_CONTROLLER_UID: AtomicU64 = AtomicU64::new(1);

/// Pose snapshot delivered to update listeners on every change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControllerUpdate {
    /// Rotation around the horizontal axis, degrees.
    pub alpha: f32,
    /// Rotation around the vertical axis, degrees.
    pub beta: f32,
    /// Distance from the orbit center, in world units.
    pub distance: f32,
}

/// Identifies a registered update listener on a specific controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListenerId {
    controller_uid: u64,
    seq: u64,
}

/// A camera posed by the orbit controller.
///
/// Only the pose matters to this engine; projection is the renderer's
/// business.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    /// Position in world space.
    pub position: Vec3,
    /// The point the camera looks at (the globe center).
    pub target: Vec3,
}

impl Camera {
    /// A camera at the origin looking at the origin.
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            target: Vec3::ZERO,
        }
    }

    /// The normalized view direction, or zero when position and target
    /// coincide.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

type UpdateListener = Box<dyn FnMut(&ControllerUpdate)>;

/// Orbit-style controller with damped motion, clamped ranges, and update
/// listeners.
///
/// Angles are in degrees, matching the declarative config. Distances are in
/// world units measured from the orbit center; the view-control config
/// expresses them relative to the globe surface and is offset by the base
/// radius when applied.
pub struct OrbitController {
    uid: u64,
    alpha: f32,
    beta: f32,
    distance: f32,
    target_alpha: f32,
    target_beta: f32,
    target_distance: f32,
    min_alpha: f32,
    max_alpha: f32,
    min_beta: f32,
    max_beta: f32,
    min_distance: f32,
    max_distance: f32,
    damping: f32,
    last_applied: Option<(ViewControlConfig, f32)>,
    listeners: Vec<(u64, UpdateListener)>,
    next_listener_seq: u64,
}

impl OrbitController {
    /// A controller with unconstrained ranges and no damping.
    pub fn new() -> Self {
        Self {
            uid: NEXT_CONTROLLER_UID.fetch_add(1, Ordering::Relaxed),
            alpha: 0.0,
            beta: 0.0,
            distance: 0.0,
            target_alpha: 0.0,
            target_beta: 0.0,
            target_distance: 0.0,
            min_alpha: -90.0,
            max_alpha: 90.0,
            min_beta: f32::NEG_INFINITY,
            max_beta: f32::INFINITY,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            damping: 0.0,
            last_applied: None,
            listeners: Vec::new(),
            next_listener_seq: 0,
        }
    }

    /// Unique identity of this controller instance.
    pub fn uid(&self) -> u64 {
        self.uid
    }

    /// Current rotation around the horizontal axis, degrees.
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Current rotation around the vertical axis, degrees.
    pub fn beta(&self) -> f32 {
        self.beta
    }

    /// Current distance from the orbit center, world units.
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Apply the declarative view-control config, with distances offset by
    /// `base_radius` so the config stays scale independent.
    ///
    /// Ranges and damping are refreshed every call; the pose snaps to the
    /// configured initial values only when the config (or radius) actually
    /// changed, so a config re-sent verbatim each cycle never fights user
    /// interaction.
    pub fn apply_view_control(&mut self, view: &ViewControlConfig, base_radius: f32) {
        self.min_alpha = view.min_alpha;
        self.max_alpha = view.max_alpha;
        self.min_beta = view.min_beta;
        self.max_beta = view.max_beta;
        self.min_distance = view.min_distance + base_radius;
        self.max_distance = view.max_distance + base_radius;
        self.damping = view.damping.clamp(0.0, 0.999);

        let unchanged = self
            .last_applied
            .as_ref()
            .is_some_and(|(v, r)| v == view && *r == base_radius);
        if unchanged {
            return;
        }
        self.last_applied = Some((view.clone(), base_radius));

        self.target_alpha = view.alpha.clamp(self.min_alpha, self.max_alpha);
        self.target_beta = view.beta.clamp(self.min_beta, self.max_beta);
        self.target_distance =
            (view.distance + base_radius).clamp(self.min_distance, self.max_distance);
        self.alpha = self.target_alpha;
        self.beta = self.target_beta;
        self.distance = self.target_distance;
        self.notify();
    }

    /// Rotate toward a new target pose.
    pub fn rotate(&mut self, delta_alpha: f32, delta_beta: f32) {
        self.target_alpha = (self.target_alpha + delta_alpha).clamp(self.min_alpha, self.max_alpha);
        self.target_beta = (self.target_beta + delta_beta).clamp(self.min_beta, self.max_beta);
        if self.damping == 0.0 {
            self.alpha = self.target_alpha;
            self.beta = self.target_beta;
            self.notify();
        }
    }

    /// Zoom toward a new target distance. Positive deltas move outward.
    pub fn zoom(&mut self, delta_distance: f32) {
        self.target_distance =
            (self.target_distance + delta_distance).clamp(self.min_distance, self.max_distance);
        if self.damping == 0.0 {
            self.distance = self.target_distance;
            self.notify();
        }
    }

    /// Advance damped motion one frame. Emits an update when the pose moved.
    pub fn tick(&mut self) {
        const EPSILON: f32 = 1e-4;
        let step = 1.0 - self.damping;

        let mut moved = false;
        for (value, target) in [
            (&mut self.alpha, self.target_alpha),
            (&mut self.beta, self.target_beta),
            (&mut self.distance, self.target_distance),
        ] {
            let delta = target - *value;
            if delta.abs() > EPSILON {
                *value = if (delta * step).abs() < EPSILON {
                    target
                } else {
                    *value + delta * step
                };
                moved = true;
            }
        }

        if moved {
            self.notify();
        }
    }

    /// Pose the camera from the current orbit parameters around `center`.
    pub fn update_camera(&self, camera: &mut Camera, center: Vec3) {
        let alpha = self.alpha.to_radians();
        let beta = self.beta.to_radians();
        let cos_alpha = alpha.cos();

        camera.target = center;
        camera.position = center
            + Vec3::new(
                cos_alpha * beta.sin(),
                alpha.sin(),
                cos_alpha * beta.cos(),
            ) * self.distance;
    }

    /// Register an update listener. Fired on every pose change.
    pub fn on_update(&mut self, listener: UpdateListener) -> ListenerId {
        let seq = self.next_listener_seq;
        self.next_listener_seq += 1;
        self.listeners.push((seq, listener));
        ListenerId {
            controller_uid: self.uid,
            seq,
        }
    }

    /// Remove a previously registered listener. Ignores ids minted by a
    /// different controller instance; returns whether a listener was removed.
    pub fn off_update(&mut self, id: ListenerId) -> bool {
        if id.controller_uid != self.uid {
            return false;
        }
        let before = self.listeners.len();
        self.listeners.retain(|(seq, _)| *seq != id.seq);
        self.listeners.len() != before
    }

    /// Number of registered update listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn notify(&mut self) {
        let update = ControllerUpdate {
            alpha: self.alpha,
            beta: self.beta,
            distance: self.distance,
        };
        for (_, listener) in &mut self.listeners {
            listener(&update);
        }
    }
}

impl Default for OrbitController {
    fn default() -> Self {
        Self::new()
    }
}
