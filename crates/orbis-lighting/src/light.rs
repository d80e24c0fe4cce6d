//! Main light placement from a sun position.

use glam::Vec3;

use crate::ephemeris::SunPosition;

/// Direction from the globe center toward the sun, unit length.
///
/// Axis mapping: the altitude alone drives X, while the azimuth sweeps the
/// horizon component through the YZ plane.
pub fn sun_light_position(sun: SunPosition) -> Vec3 {
    let r0 = sun.altitude.cos();
    Vec3::new(
        sun.altitude.sin(),
        -r0 * sun.azimuth.cos(),
        r0 * sun.azimuth.sin(),
    )
}

/// The scene's main (sun) light: a direction plus the point it aims at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MainLight {
    /// Light position on the unit sky sphere around the target.
    pub position: Vec3,
    /// The point the light looks at (the globe center).
    pub target: Vec3,
}

impl MainLight {
    /// A light at noon position aimed at the origin.
    pub fn new() -> Self {
        Self {
            position: Vec3::X,
            target: Vec3::ZERO,
        }
    }

    /// Re-aim the light for a sun position, keeping it pointed at `center`.
    pub fn update(&mut self, sun: SunPosition, center: Vec3) {
        self.position = sun_light_position(sun);
        self.target = center;
    }

    /// Normalized direction the light shines along.
    pub fn direction(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }
}

impl Default for MainLight {
    fn default() -> Self {
        Self::new()
    }
}
