//! Triangle mesh and edge wireframe extraction

use glam::{Mat3, Mat4, Vec3};
use std::collections::HashMap;

/// Angle above which a shared edge between two faces counts as a feature edge.
pub const EDGE_THRESHOLD_DEG: f32 = 1.0;

/// Indexed triangle mesh with per-vertex normals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    /// Triangle indices (i0, i1, i2), counter-clockwise when seen from outside.
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn with_capacity(vertices: usize, indices: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertices),
            normals: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(indices),
        }
    }

    #[inline]
    pub fn add_vertex(&mut self, position: Vec3, normal: Vec3) -> u32 {
        let idx = self.positions.len() as u32;
        self.positions.push(position);
        self.normals.push(normal);
        idx
    }

    #[inline]
    pub fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32) {
        self.indices.extend_from_slice(&[i0, i1, i2]);
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Axis-aligned bounds, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p))),
        )
    }

    /// Applies an affine transform to positions and normals in place.
    pub fn transform(&mut self, transform: &Mat4) {
        for p in &mut self.positions {
            *p = transform.transform_point3(*p);
        }

        let normal_matrix = Mat3::from_mat4(*transform).inverse().transpose();
        for n in &mut self.normals {
            *n = (normal_matrix * *n).normalize_or_zero();
        }
    }

    /// Appends `other`, re-basing its indices.
    pub fn append(&mut self, other: &Mesh) {
        let base = self.positions.len() as u32;
        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }

    /// Feature edges: boundary edges plus shared edges whose faces meet at
    /// more than `threshold_deg`. Coincident vertices are welded first so
    /// split caps and walls share their edges.
    pub fn feature_edges(&self, threshold_deg: f32) -> Vec<[Vec3; 2]> {
        let cos_threshold = threshold_deg.to_radians().cos();

        // Edge key -> slot in `edges`; insertion order keeps output stable.
        let mut slots: HashMap<(VertexKey, VertexKey), usize> = HashMap::new();
        let mut edges: Vec<EdgeRecord> = Vec::new();

        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [
                self.positions[tri[0] as usize],
                self.positions[tri[1] as usize],
                self.positions[tri[2] as usize],
            ];
            let normal = (b - a).cross(c - a).normalize_or_zero();
            if normal == Vec3::ZERO {
                continue;
            }

            for (p, q) in [(a, b), (b, c), (c, a)] {
                let (kp, kq) = (VertexKey::new(p), VertexKey::new(q));
                if kp == kq {
                    continue;
                }
                let key = if kp < kq { (kp, kq) } else { (kq, kp) };

                match slots.get(&key) {
                    Some(&slot) => {
                        let record = &mut edges[slot];
                        record.faces += 1;
                        if record.normal.dot(normal) <= cos_threshold {
                            record.sharp = true;
                        }
                    }
                    None => {
                        slots.insert(key, edges.len());
                        edges.push(EdgeRecord {
                            ends: [p, q],
                            normal,
                            faces: 1,
                            sharp: false,
                        });
                    }
                }
            }
        }

        edges
            .into_iter()
            .filter(|e| e.faces == 1 || e.sharp)
            .map(|e| e.ends)
            .collect()
    }
}

struct EdgeRecord {
    ends: [Vec3; 2],
    normal: Vec3,
    faces: u32,
    sharp: bool,
}

/// Position quantized to 0.1 mm for welding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct VertexKey([i64; 3]);

impl VertexKey {
    fn new(p: Vec3) -> Self {
        const Q: f32 = 1e4;
        Self([
            (p.x * Q).round() as i64,
            (p.y * Q).round() as i64,
            (p.z * Q).round() as i64,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_quad() -> Mesh {
        let mut mesh = Mesh::default();
        let n = Vec3::Z;
        let a = mesh.add_vertex(Vec3::new(0.0, 0.0, 0.0), n);
        let b = mesh.add_vertex(Vec3::new(1.0, 0.0, 0.0), n);
        let c = mesh.add_vertex(Vec3::new(1.0, 1.0, 0.0), n);
        let d = mesh.add_vertex(Vec3::new(0.0, 1.0, 0.0), n);
        mesh.add_triangle(a, b, c);
        mesh.add_triangle(a, c, d);
        mesh
    }

    #[test]
    fn test_flat_quad_hides_diagonal() {
        let edges = unit_quad().feature_edges(EDGE_THRESHOLD_DEG);
        assert_eq!(edges.len(), 4);
        // The shared diagonal (0,0)-(1,1) is coplanar and must not show.
        assert!(!edges.iter().any(|[p, q]| {
            (*p == Vec3::ZERO && *q == Vec3::new(1.0, 1.0, 0.0))
                || (*q == Vec3::ZERO && *p == Vec3::new(1.0, 1.0, 0.0))
        }));
    }

    #[test]
    fn test_bounds_and_transform() {
        let mut mesh = unit_quad();
        assert_eq!(mesh.bounds(), Some((Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0))));

        mesh.transform(&Mat4::from_translation(Vec3::new(0.0, 0.0, 3.0)));
        let (lo, hi) = mesh.bounds().unwrap();
        assert_eq!(lo.z, 3.0);
        assert_eq!(hi.z, 3.0);
        assert!(mesh.normals.iter().all(|n| (*n - Vec3::Z).length() < 1e-6));
    }

    #[test]
    fn test_append_rebases_indices() {
        let mut mesh = unit_quad();
        mesh.append(&unit_quad());
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 4);
        assert_eq!(&mesh.indices[6..9], &[4, 5, 6]);
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = Mesh::default();
        assert!(mesh.is_empty());
        assert_eq!(mesh.bounds(), None);
        assert!(mesh.feature_edges(EDGE_THRESHOLD_DEG).is_empty());
    }
}
