//! Sun-driven main light placement.
//!
//! The astronomical calculation lives behind [`SunEphemeris`]; the engine
//! only consumes an (altitude, azimuth) pair for a point in time and turns it
//! into a light direction aimed at the globe.

mod ephemeris;
mod light;

pub use ephemeris::{EquinoxSun, SunEphemeris, SunPosition, resolve_timestamp_ms};
pub use light::{MainLight, sun_light_position};
