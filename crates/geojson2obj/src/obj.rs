//! Wavefront OBJ output for floor solids and network segments.

use floorplan::{FloorLayer, LinkNetwork, Mesh};
use std::io::{self, Write};

/// Streams objects into one OBJ file. OBJ indices are global and 1-based,
/// so the writer tracks how many vertices and normals precede each object.
pub struct ObjWriter<W: Write> {
    out: W,
    vertices: u32,
    normals: u32,
}

impl<W: Write> ObjWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            vertices: 0,
            normals: 0,
        }
    }

    pub fn comment(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "# {text}")
    }

    /// Writes `mesh` as a named object with `f v//vn` faces.
    pub fn mesh(&mut self, name: &str, mesh: &Mesh) -> io::Result<()> {
        writeln!(self.out, "o {name}")?;
        for p in &mesh.positions {
            writeln!(self.out, "v {} {} {}", p.x, p.y, p.z)?;
        }
        for n in &mesh.normals {
            writeln!(self.out, "vn {} {} {}", n.x, n.y, n.z)?;
        }

        let (v0, n0) = (self.vertices + 1, self.normals + 1);
        for tri in mesh.indices.chunks_exact(3) {
            writeln!(
                self.out,
                "f {}//{} {}//{} {}//{}",
                v0 + tri[0],
                n0 + tri[0],
                v0 + tri[1],
                n0 + tri[1],
                v0 + tri[2],
                n0 + tri[2]
            )?;
        }

        self.vertices += mesh.positions.len() as u32;
        self.normals += mesh.normals.len() as u32;
        Ok(())
    }

    /// Writes every segment as its own two-vertex `l` element.
    pub fn segments(&mut self, name: &str, network: &LinkNetwork) -> io::Result<()> {
        writeln!(self.out, "o {name}")?;
        for s in &network.segments {
            writeln!(self.out, "v {} {} {}", s.start.x, s.start.y, s.start.z)?;
            writeln!(self.out, "v {} {} {}", s.end.x, s.end.y, s.end.z)?;
        }

        let v0 = self.vertices + 1;
        for i in 0..network.segments.len() as u32 {
            writeln!(self.out, "l {} {}", v0 + 2 * i, v0 + 2 * i + 1)?;
        }

        self.vertices += 2 * network.segments.len() as u32;
        Ok(())
    }

    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

/// Every layer of one floor; one object per kind with its features merged.
pub fn write_floor<W: Write>(out: W, label: &str, layers: &[FloorLayer]) -> io::Result<W> {
    let mut obj = ObjWriter::new(out);
    obj.comment(&format!("floor {label}"))?;

    for layer in layers {
        let mut merged = Mesh::default();
        for feature in &layer.features {
            merged.append(&feature.solid);
        }
        if merged.is_empty() {
            continue;
        }
        obj.mesh(&format!("{label}_{}", layer.kind), &merged)?;
    }

    obj.finish()
}

pub fn write_network<W: Write>(out: W, network: &LinkNetwork) -> io::Result<W> {
    let mut obj = ObjWriter::new(out);
    obj.comment(&format!(
        "pedestrian network: {} edges, {} segments",
        network.edges,
        network.segments.len()
    ))?;
    obj.segments("pedestrian_network", network)?;
    obj.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorplan::{FeatureKind, LayerAssembler, LinkDirection, LinkSegment};
    use glam::{DVec2, Vec3};

    fn lines_starting(text: &str, tag: &str) -> Vec<String> {
        text.lines()
            .filter(|l| l.split_whitespace().next() == Some(tag))
            .map(str::to_owned)
            .collect()
    }

    fn square(offset: f64) -> Vec<DVec2> {
        vec![
            DVec2::new(offset, 0.0),
            DVec2::new(offset, 10.0),
            DVec2::new(offset + 10.0, 10.0),
            DVec2::new(offset + 10.0, 0.0),
        ]
    }

    #[test]
    fn test_face_indices_continue_across_objects() {
        let assembler = LayerAssembler::new(DVec2::ZERO, 30.0);
        let a = assembler.place(1, &square(0.0), 5.0).unwrap();
        let b = assembler.place(1, &square(20.0), 5.0).unwrap();
        let layers = vec![
            FloorLayer {
                floor: 1,
                kind: FeatureKind::Space,
                features: vec![a.clone()],
                skipped: 0,
            },
            FloorLayer {
                floor: 1,
                kind: FeatureKind::Fixture,
                features: vec![b],
                skipped: 0,
            },
        ];

        let out = write_floor(Vec::new(), "1F", &layers).unwrap();
        let text = String::from_utf8(out).unwrap();

        let vertex_count = a.solid.vertex_count();
        assert_eq!(lines_starting(&text, "o"), vec!["o 1F_Space", "o 1F_Fixture"]);
        assert_eq!(lines_starting(&text, "v").len(), 2 * vertex_count);
        assert_eq!(lines_starting(&text, "vn").len(), 2 * vertex_count);
        assert_eq!(lines_starting(&text, "f").len(), 2 * a.solid.triangle_count());

        let max_index = lines_starting(&text, "f")
            .iter()
            .flat_map(|l| l.split_whitespace().skip(1).map(str::to_owned).collect::<Vec<_>>())
            .map(|corner| corner.split("//").next().unwrap().parse::<usize>().unwrap())
            .max()
            .unwrap();
        assert_eq!(max_index, 2 * vertex_count);
    }

    #[test]
    fn test_empty_layers_are_left_out() {
        let layers = vec![FloorLayer {
            floor: -1,
            kind: FeatureKind::Floor,
            features: Vec::new(),
            skipped: 2,
        }];

        let text = String::from_utf8(write_floor(Vec::new(), "B1", &layers).unwrap()).unwrap();
        assert_eq!(text, "# floor B1\n");
    }

    #[test]
    fn test_network_segments_become_line_elements() {
        let segment = |x: f32| LinkSegment {
            start: Vec3::new(x, 0.0, 0.0),
            end: Vec3::new(x + 1.0, 0.0, 0.0),
            distance: 1.0,
            direction: LinkDirection::Forward,
        };
        let network = LinkNetwork {
            segments: vec![segment(0.0), segment(1.0), segment(2.0)],
            edges: 1,
            unresolved_endpoints: 0,
        };

        let text = String::from_utf8(write_network(Vec::new(), &network).unwrap()).unwrap();

        assert_eq!(lines_starting(&text, "v").len(), 6);
        assert_eq!(lines_starting(&text, "l"), vec!["l 1 2", "l 3 4", "l 5 6"]);
        assert!(text.starts_with("# pedestrian network: 1 edges, 3 segments\n"));
    }
}
