//! Sun position as a pure function of time.

use chrono::{DateTime, Utc};

/// Where the sun sits in the sky, in radians.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SunPosition {
    /// Elevation above the horizon.
    pub altitude: f32,
    /// Angle from solar noon, positive toward the west.
    pub azimuth: f32,
}

/// Computes the sun's position for a timestamp.
///
/// Implementations are pure: the same timestamp always yields the same
/// position. A full astronomical model plugs in here; the engine ships a
/// simplified one for defaults and tests.
pub trait SunEphemeris {
    /// Sun position at the given milliseconds since the Unix epoch.
    fn position(&self, timestamp_ms: i64) -> SunPosition;
}

/// Simplified ephemeris: an observer on the equator at equinox.
///
/// The sun passes directly overhead at 12:00 UTC and directly below at
/// midnight; altitude and azimuth both derive from the hour angle alone.
/// Good enough to make the day side face the right way.
#[derive(Clone, Copy, Debug, Default)]
pub struct EquinoxSun;

impl SunEphemeris for EquinoxSun {
    fn position(&self, timestamp_ms: i64) -> SunPosition {
        const DAY_MS: i64 = 86_400_000;
        let day_fraction = timestamp_ms.rem_euclid(DAY_MS) as f64 / DAY_MS as f64;
        // 0 at solar noon, ±PI at midnight.
        let hour_angle = (day_fraction - 0.5) * std::f64::consts::TAU;

        SunPosition {
            altitude: (std::f64::consts::FRAC_PI_2 * hour_angle.cos()) as f32,
            azimuth: hour_angle as f32,
        }
    }
}

/// Resolve a config time string to milliseconds since the Unix epoch.
///
/// Empty strings mean "now". Unparsable strings warn and fall back to "now",
/// so a typo in a config degrades to the current sun instead of stopping the
/// render cycle.
pub fn resolve_timestamp_ms(time: &str) -> i64 {
    if time.is_empty() {
        return Utc::now().timestamp_millis();
    }
    match DateTime::parse_from_rfc3339(time) {
        Ok(parsed) => parsed.timestamp_millis(),
        Err(err) => {
            tracing::warn!("unparsable light time \"{time}\" ({err}), using current time");
            Utc::now().timestamp_millis()
        }
    }
}
