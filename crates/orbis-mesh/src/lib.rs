//! Sphere geometry and heightmap vertex displacement.
//!
//! [`SphereGeometry`] is a UV-mapped unit sphere whose positions and normals
//! mutate in place; [`displace`] perturbs it from a raster height field and
//! [`reset`] restores the undisplaced shape exactly.

pub mod bounds;
pub mod displacement;
pub mod sphere;

pub use bounds::Aabb;
pub use displacement::{DisplacementError, DisplacementState, displace, reset};
pub use sphere::SphereGeometry;
