//! Extrusion of floor-plan rings into solids

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use glam::{DVec2, Vec3};

/// Recenters `ring` on `origin` and turns it into a closed path: the final
/// point is dropped when it repeats the first, consecutive duplicates are
/// merged, and the winding is made counter-clockwise.
pub fn closed_path(ring: &[DVec2], origin: DVec2) -> Result<Vec<DVec2>> {
    let mut path: Vec<DVec2> = Vec::with_capacity(ring.len());

    for p in ring {
        if !p.is_finite() {
            return Err(Error::DegenerateRing("non-finite coordinate".to_string()));
        }
        let p = *p - origin;
        if path.last().map_or(true, |last| !last.abs_diff_eq(p, 1e-9)) {
            path.push(p);
        }
    }

    if path.len() > 1 && path[0].abs_diff_eq(path[path.len() - 1], 1e-9) {
        path.pop();
    }

    if path.len() < 3 {
        return Err(Error::DegenerateRing(format!(
            "need at least 3 distinct points, got {}",
            path.len()
        )));
    }

    if signed_area(&path) < 0.0 {
        path.reverse();
    }

    Ok(path)
}

/// Shoelace area; positive for counter-clockwise paths.
pub fn signed_area(path: &[DVec2]) -> f64 {
    let n = path.len();
    (0..n)
        .map(|i| {
            let (a, b) = (path[i], path[(i + 1) % n]);
            a.x * b.y - b.x * a.y
        })
        .sum::<f64>()
        * 0.5
}

/// Extrudes a polygon ring along +Z by `depth` (no bevel, one step).
///
/// Produces a bottom cap at z = 0, a top cap at z = `depth` and one quad
/// per path edge. Coordinates are recentered on `origin` first.
pub fn extrude_ring(ring: &[DVec2], origin: DVec2, depth: f64) -> Result<Mesh> {
    if !(depth.is_finite() && depth > 0.0) {
        return Err(Error::InvalidDepth(depth));
    }

    let path = closed_path(ring, origin)?;
    if signed_area(&path).abs() < 1e-12 {
        return Err(Error::DegenerateRing("zero area".to_string()));
    }

    let flat: Vec<f64> = path.iter().flat_map(|p| [p.x, p.y]).collect();
    let triangles = earcutr::earcut(&flat, &[], 2)
        .map_err(|e| Error::Triangulation(format!("{e:?}")))?;
    if triangles.is_empty() {
        return Err(Error::Triangulation("no triangles produced".to_string()));
    }

    let n = path.len();
    let mut mesh = Mesh::with_capacity(n * 6, triangles.len() * 2 + n * 6);
    let depth = depth as f32;

    // Caps
    for (z, normal) in [(0.0, Vec3::NEG_Z), (depth, Vec3::Z)] {
        let base = mesh.vertex_count() as u32;
        for p in &path {
            mesh.add_vertex(Vec3::new(p.x as f32, p.y as f32, z), normal);
        }
        for tri in triangles.chunks_exact(3) {
            let [i0, i1, i2] = [tri[0] as u32, tri[1] as u32, tri[2] as u32];
            // Bottom cap faces down
            if z == 0.0 {
                mesh.add_triangle(base + i0, base + i2, base + i1);
            } else {
                mesh.add_triangle(base + i0, base + i1, base + i2);
            }
        }
    }

    // Side walls
    for i in 0..n {
        let p0 = path[i];
        let p1 = path[(i + 1) % n];
        let edge = p1 - p0;
        let normal = Vec3::new(edge.y as f32, -edge.x as f32, 0.0).normalize_or_zero();

        let (x0, y0, x1, y1) = (p0.x as f32, p0.y as f32, p1.x as f32, p1.y as f32);
        let a = mesh.add_vertex(Vec3::new(x0, y0, 0.0), normal);
        let b = mesh.add_vertex(Vec3::new(x1, y1, 0.0), normal);
        let c = mesh.add_vertex(Vec3::new(x1, y1, depth), normal);
        let d = mesh.add_vertex(Vec3::new(x0, y0, depth), normal);
        mesh.add_triangle(a, b, c);
        mesh.add_triangle(a, c, d);
    }

    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square() -> Vec<DVec2> {
        [[0.0, 0.0], [0.0, 10.0], [10.0, 10.0], [10.0, 0.0], [0.0, 0.0]]
            .iter()
            .map(|p| DVec2::from(*p))
            .collect()
    }

    /// Area of all triangles facing +Z.
    fn top_area(mesh: &Mesh) -> f32 {
        mesh.indices
            .chunks_exact(3)
            .map(|t| {
                let [a, b, c] = [
                    mesh.positions[t[0] as usize],
                    mesh.positions[t[1] as usize],
                    mesh.positions[t[2] as usize],
                ];
                let cross = (b - a).cross(c - a);
                if cross.z > 0.0 && cross.normalize().z > 0.99 {
                    cross.length() * 0.5
                } else {
                    0.0
                }
            })
            .sum()
    }

    #[test]
    fn test_extrude_square() {
        let mesh = extrude_ring(&square(), DVec2::ZERO, 5.0).unwrap();

        let (lo, hi) = mesh.bounds().unwrap();
        assert_relative_eq!(hi.z - lo.z, 5.0);
        assert_relative_eq!(hi.x - lo.x, 10.0);
        assert_relative_eq!(hi.y - lo.y, 10.0);
        assert_relative_eq!(top_area(&mesh), 100.0, epsilon = 1e-3);

        // 4 + 4 cap vertices, 4 quads of 4 vertices
        assert_eq!(mesh.vertex_count(), 24);
        // 2 + 2 cap triangles, 8 wall triangles
        assert_eq!(mesh.triangle_count(), 12);
    }

    #[test]
    fn test_recenter_on_origin() {
        let origin = DVec2::new(-12000.0, -34000.0);
        let ring: Vec<DVec2> = square().into_iter().map(|p| p + origin).collect();
        let mesh = extrude_ring(&ring, origin, 0.5).unwrap();
        let (lo, hi) = mesh.bounds().unwrap();
        assert_relative_eq!(lo.x, 0.0);
        assert_relative_eq!(hi.y, 10.0);
        assert_relative_eq!(hi.z, 0.5);
    }

    #[test]
    fn test_clockwise_ring_walls_face_out() {
        // `square()` is clockwise; walls must still point away from the center.
        let mesh = extrude_ring(&square(), DVec2::ZERO, 5.0).unwrap();
        let center = Vec3::new(5.0, 5.0, 2.5);
        for (p, n) in mesh.positions.iter().zip(&mesh.normals) {
            if n.z == 0.0 {
                assert!((*p - center).dot(*n) > 0.0);
            }
        }
    }

    #[test]
    fn test_unclosed_ring_is_accepted() {
        let ring = &square()[..4];
        let mesh = extrude_ring(ring, DVec2::ZERO, 1.0).unwrap();
        assert_relative_eq!(top_area(&mesh), 100.0, epsilon = 1e-3);
    }

    #[test]
    fn test_degenerate_inputs() {
        let line = [DVec2::ZERO, DVec2::new(1.0, 0.0), DVec2::ZERO];
        assert!(matches!(
            extrude_ring(&line, DVec2::ZERO, 1.0),
            Err(Error::DegenerateRing(_))
        ));

        let collinear = [DVec2::ZERO, DVec2::new(1.0, 0.0), DVec2::new(2.0, 0.0)];
        assert!(extrude_ring(&collinear, DVec2::ZERO, 1.0).is_err());

        assert!(matches!(
            extrude_ring(&square(), DVec2::ZERO, 0.0),
            Err(Error::InvalidDepth(_))
        ));

        let nan = [DVec2::ZERO, DVec2::new(f64::NAN, 1.0), DVec2::new(1.0, 1.0)];
        assert!(extrude_ring(&nan, DVec2::ZERO, 1.0).is_err());
    }

    #[test]
    fn test_box_feature_edges() {
        let mesh = extrude_ring(&square(), DVec2::ZERO, 5.0).unwrap();
        // 4 top, 4 bottom, 4 vertical
        assert_eq!(mesh.feature_edges(crate::mesh::EDGE_THRESHOLD_DEG).len(), 12);
    }
}
