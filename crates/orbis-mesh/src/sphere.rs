//! UV-mapped unit sphere geometry with mutable positions and normals.

use glam::Vec3;

use crate::bounds::Aabb;

/// A UV sphere of unit radius.
///
/// Vertex count and UV layout are fixed at construction; only positions and
/// normals mutate afterwards. Rings run from the +Y pole (v = 0) to the -Y
/// pole (v = 1), with u wrapping once around the equator. The seam column is
/// duplicated so UVs stay continuous per face.
#[derive(Clone, Debug)]
pub struct SphereGeometry {
    /// Vertex positions, mutated by displacement.
    pub positions: Vec<[f32; 3]>,
    /// Vertex normals, regenerated after displacement.
    pub normals: Vec<[f32; 3]>,
    /// Texture coordinates, fixed at construction.
    pub uvs: Vec<[f32; 2]>,
    /// Triangle indices, fixed at construction.
    pub indices: Vec<u32>,
    width_segments: u32,
    height_segments: u32,
    bounds: Aabb,
    dirty: bool,
}

impl SphereGeometry {
    /// Build a unit sphere with the given segment counts.
    ///
    /// Segment counts below 3 (width) / 2 (height) are raised to those
    /// minimums so the surface is always closed.
    pub fn new(width_segments: u32, height_segments: u32) -> Self {
        let w = width_segments.max(3);
        let h = height_segments.max(2);
        let ring = (w + 1) as usize;
        let vertex_count = ring * (h + 1) as usize;

        let mut positions = Vec::with_capacity(vertex_count);
        let mut uvs = Vec::with_capacity(vertex_count);

        for i in 0..=h {
            let v = i as f32 / h as f32;
            let theta = v * std::f32::consts::PI;
            let y = theta.cos();
            let sin_theta = theta.sin();

            for j in 0..=w {
                let u = j as f32 / w as f32;
                let phi = u * std::f32::consts::TAU;
                let x = phi.cos() * sin_theta;
                let z = phi.sin() * sin_theta;

                positions.push([x, y, z]);
                uvs.push([u, v]);
            }
        }

        // Wound counter-clockwise seen from outside the sphere, so
        // accumulated face normals point outward.
        let mut indices = Vec::with_capacity(w as usize * h as usize * 6);
        for i in 0..h {
            for j in 0..w {
                let a = i * (w + 1) + j;
                let b = a + (w + 1);
                indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
            }
        }

        // A unit sphere's normals are its positions.
        let normals = positions.clone();
        let bounds = Aabb::from_points(positions.iter().map(|p| Vec3::from_array(*p)));

        Self {
            positions,
            normals,
            uvs,
            indices,
            width_segments: w,
            height_segments: h,
            bounds,
            dirty: false,
        }
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Width segments the sphere was built with.
    pub fn width_segments(&self) -> u32 {
        self.width_segments
    }

    /// Height segments the sphere was built with.
    pub fn height_segments(&self) -> u32 {
        self.height_segments
    }

    /// Current bounding box.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Recompute the bounding box from current positions.
    pub fn update_bounds(&mut self) {
        self.bounds = Aabb::from_points(self.positions.iter().map(|p| Vec3::from_array(*p)));
    }

    /// Regenerate vertex normals from current positions by accumulating
    /// area-weighted face normals.
    pub fn generate_vertex_normals(&mut self) {
        for n in &mut self.normals {
            *n = [0.0; 3];
        }

        for tri in self.indices.chunks_exact(3) {
            let [ia, ib, ic] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let a = Vec3::from_array(self.positions[ia]);
            let b = Vec3::from_array(self.positions[ib]);
            let c = Vec3::from_array(self.positions[ic]);
            // Cross-product length weights large faces more, matching the
            // usual smooth-normal accumulation.
            let face = (b - a).cross(c - a);
            for idx in [ia, ib, ic] {
                let n = Vec3::from_array(self.normals[idx]) + face;
                self.normals[idx] = n.to_array();
            }
        }

        for n in &mut self.normals {
            let v = Vec3::from_array(*n).normalize_or_zero();
            *n = v.to_array();
        }
    }

    /// Mark the geometry as needing re-upload.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns and clears the dirty flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Returns the dirty flag without clearing it.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Position buffer as bytes for upload.
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Normal buffer as bytes for upload.
    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }
}
