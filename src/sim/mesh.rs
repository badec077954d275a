//! Collision geometry
//!
//! Triangle meshes with per-vertex normals. The renderer owns the visual
//! models; these are the shapes the simulation raycasts against.

use std::f32::consts::TAU;

use glam::{Mat3, Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Which model an entity (or the player) is drawn and collided with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    Cat,
    Halo,
    Bird,
    Cloud,
    Island,
}

impl ModelKind {
    pub const ALL: [ModelKind; 5] = [
        ModelKind::Cat,
        ModelKind::Halo,
        ModelKind::Bird,
        ModelKind::Cloud,
        ModelKind::Island,
    ];

    /// Path the asset loader fetches this model from
    pub fn path(&self) -> &'static str {
        match self {
            ModelKind::Cat => "models/cat.glb",
            ModelKind::Halo => "models/halo.glb",
            ModelKind::Bird => "models/bird.glb",
            ModelKind::Cloud => "models/cloud.glb",
            ModelKind::Island => "models/island.glb",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.path() == path)
    }
}

/// Triangle mesh in local space
#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
    bounding_radius: f32,
}

impl Mesh {
    pub fn new(vertices: Vec<Vec3>, normals: Vec<Vec3>, triangles: Vec<[u32; 3]>) -> Self {
        debug_assert_eq!(vertices.len(), normals.len());
        let bounding_radius = vertices.iter().map(|v| v.length()).fold(0.0, f32::max);
        Self {
            vertices,
            normals,
            triangles,
            bounding_radius,
        }
    }

    /// Radius of the origin-centered sphere enclosing every vertex
    pub fn bounding_radius(&self) -> f32 {
        self.bounding_radius
    }

    /// Latitude/longitude sphere
    pub fn uv_sphere(radius: f32, rings: u32, segments: u32) -> Self {
        let rings = rings.max(2);
        let segments = segments.max(3);
        let mut vertices = Vec::with_capacity(((rings + 1) * segments) as usize);
        let mut normals = Vec::with_capacity(vertices.capacity());

        for i in 0..=rings {
            let phi = std::f32::consts::PI * i as f32 / rings as f32;
            for j in 0..segments {
                let theta = TAU * j as f32 / segments as f32;
                let n = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
                normals.push(n);
                vertices.push(n * radius);
            }
        }

        let mut triangles = Vec::with_capacity((rings * segments * 2) as usize);
        for i in 0..rings {
            for j in 0..segments {
                let next = (j + 1) % segments;
                let a = i * segments + j;
                let b = i * segments + next;
                let c = (i + 1) * segments + j;
                let d = (i + 1) * segments + next;
                triangles.push([a, c, b]);
                triangles.push([b, c, d]);
            }
        }

        Self::new(vertices, normals, triangles)
    }

    /// Ring lying in the XZ plane
    pub fn torus(major: f32, minor: f32, radial: u32, tubular: u32) -> Self {
        let radial = radial.max(3);
        let tubular = tubular.max(3);
        let mut vertices = Vec::with_capacity((radial * tubular) as usize);
        let mut normals = Vec::with_capacity(vertices.capacity());

        for i in 0..radial {
            let u = TAU * i as f32 / radial as f32;
            let center = Vec3::new(major * u.cos(), 0.0, major * u.sin());
            for j in 0..tubular {
                let v = TAU * j as f32 / tubular as f32;
                let n = Vec3::new(v.cos() * u.cos(), v.sin(), v.cos() * u.sin());
                normals.push(n);
                vertices.push(center + n * minor);
            }
        }

        let mut triangles = Vec::with_capacity((radial * tubular * 2) as usize);
        for i in 0..radial {
            let i_next = (i + 1) % radial;
            for j in 0..tubular {
                let j_next = (j + 1) % tubular;
                let a = i * tubular + j;
                let b = i * tubular + j_next;
                let c = i_next * tubular + j;
                let d = i_next * tubular + j_next;
                triangles.push([a, c, b]);
                triangles.push([b, c, d]);
            }
        }

        Self::new(vertices, normals, triangles)
    }

    /// Flattened diamond: wingspan along X, beak along +Z
    pub fn bird(wingspan: f32) -> Self {
        let half = wingspan / 2.0;
        let vertices = vec![
            Vec3::new(half, 0.0, 0.0),
            Vec3::new(-half, 0.0, 0.0),
            Vec3::new(0.0, half * 0.25, 0.0),
            Vec3::new(0.0, -half * 0.25, 0.0),
            Vec3::new(0.0, 0.0, half * 0.6),
            Vec3::new(0.0, 0.0, -half * 0.6),
        ];
        let normals = vertices.iter().map(|v| v.normalize_or_zero()).collect();
        let triangles = vec![
            [0, 2, 4],
            [4, 2, 1],
            [1, 2, 5],
            [5, 2, 0],
            [0, 4, 3],
            [4, 1, 3],
            [1, 5, 3],
            [5, 0, 3],
        ];
        Self::new(vertices, normals, triangles)
    }

    /// Cast a ray against this mesh placed by `world`.
    ///
    /// `dir` must be unit length; the returned distance is in world units.
    pub fn raycast(&self, world: &Mat4, origin: Vec3, dir: Vec3, max_dist: f32) -> Option<f32> {
        // Broad phase: bounding sphere in world space
        let center = world.w_axis.truncate();
        let scale = world
            .x_axis
            .truncate()
            .length()
            .max(world.y_axis.truncate().length())
            .max(world.z_axis.truncate().length());
        let reach = self.bounding_radius * scale + max_dist;
        if (origin - center).length_squared() > reach * reach {
            return None;
        }

        // Affine maps preserve the ray parameter, so t found in local space
        // is the world distance along the unit world direction.
        let inv = world.inverse();
        let local_origin = inv.transform_point3(origin);
        let local_dir = inv.transform_vector3(dir);

        self.triangles
            .iter()
            .filter_map(|&[a, b, c]| {
                ray_triangle(
                    local_origin,
                    local_dir,
                    self.vertices[a as usize],
                    self.vertices[b as usize],
                    self.vertices[c as usize],
                )
            })
            .filter(|&t| t <= max_dist)
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// Vertices and outward normals placed by `world`
    pub fn world_vertices(&self, world: &Mat4) -> impl Iterator<Item = (Vec3, Vec3)> + '_ {
        let normal_matrix = Mat3::from_mat4(*world).inverse().transpose();
        let world = *world;
        self.vertices
            .iter()
            .zip(&self.normals)
            .map(move |(&v, &n)| {
                (
                    world.transform_point3(v),
                    (normal_matrix * n).normalize_or_zero(),
                )
            })
    }
}

/// Two-sided Möller-Trumbore intersection; returns the ray parameter
pub fn ray_triangle(origin: Vec3, dir: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
    const EPSILON: f32 = 1e-9;

    let edge1 = b - a;
    let edge2 = c - a;
    let p = dir.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < EPSILON {
        return None; // Parallel or degenerate
    }

    let inv_det = 1.0 / det;
    let s = origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = dir.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(q) * inv_det;
    (t >= 0.0).then_some(t)
}
