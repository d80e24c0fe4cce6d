//! The globe surface aggregate.
//!
//! [`GlobeSurface`] owns the base sphere, the overlay shell cache, the
//! materials, and the camera binding, and reconciles all of them against the
//! declarative [`orbis_model::GlobeConfig`] once per render cycle. It plugs
//! into a host render loop through the [`SceneComponent`] lifecycle.

mod component;
mod surface;

pub use component::SceneComponent;
pub use surface::GlobeSurface;
