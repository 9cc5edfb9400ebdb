//! Loaded geometry: CPU to GPU conversion and the scene the renderer draws.

use crate::data::types::{LayerGpu, LineVertex, LinesGpu, LinkGpu, MeshVertex, SegmentInstance};
use floorplan::{ContextLines, FloorLayer, FloorRegistry, LinkNetwork, LoadOutput};
use glam::Vec3;
use wgpu::util::DeviceExt;

/// Thin context lines sit well behind the terminal visually.
pub const CONTEXT_COLOR: [f32; 4] = [0.45, 0.47, 0.52, 0.6];

/// Flattens a layer's solids into one vertex and index buffer.
pub fn layer_vertices(layer: &FloorLayer) -> (Vec<MeshVertex>, Vec<u32>) {
    let color = layer.kind.fill_color();
    let vertex_total: usize = layer.features.iter().map(|f| f.solid.vertex_count()).sum();
    let mut vertices = Vec::with_capacity(vertex_total);
    let mut indices = Vec::with_capacity(layer.triangle_count() * 3);

    for feature in &layer.features {
        let base = vertices.len() as u32;
        vertices.extend(
            feature
                .solid
                .positions
                .iter()
                .zip(&feature.solid.normals)
                .map(|(p, n)| MeshVertex {
                    position: p.to_array(),
                    normal: n.to_array(),
                    color,
                }),
        );
        indices.extend(feature.solid.indices.iter().map(|i| base + i));
    }

    (vertices, indices)
}

/// Outline pairs of every feature in the layer.
pub fn edge_vertices(layer: &FloorLayer) -> Vec<LineVertex> {
    let color = layer.kind.edge_color();
    layer
        .features
        .iter()
        .flat_map(|f| f.edges.iter())
        .flat_map(|[a, b]| [*a, *b])
        .map(|p| LineVertex {
            position: p.to_array(),
            color,
        })
        .collect()
}

pub fn segment_instances(network: &LinkNetwork) -> Vec<SegmentInstance> {
    network
        .segments
        .iter()
        .map(|s| SegmentInstance {
            start: s.start.to_array(),
            distance: s.distance,
            end: s.end.to_array(),
            direction: s.direction.as_u32(),
        })
        .collect()
}

pub fn context_vertices(lines: &ContextLines) -> Vec<LineVertex> {
    lines
        .segments()
        .flat_map(|[a, b]| [a, b])
        .map(|p| LineVertex {
            position: p.to_array(),
            color: CONTEXT_COLOR,
        })
        .collect()
}

/// Uploads a layer. Returns `None` when it has nothing to draw.
pub fn upload_layer(device: &wgpu::Device, layer: &FloorLayer) -> Option<LayerGpu> {
    let (vertices, indices) = layer_vertices(layer);
    if indices.is_empty() {
        return None;
    }
    let edges = edge_vertices(layer);

    let label = format!("{} {}", floorplan::floor::floor_label(layer.floor), layer.kind);

    let solid_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{label} Solid VB")),
        contents: bytemuck::cast_slice(&vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let solid_ib = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{label} Solid IB")),
        contents: bytemuck::cast_slice(&indices),
        usage: wgpu::BufferUsages::INDEX,
    });
    let edge_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{label} Edge VB")),
        contents: bytemuck::cast_slice(&edges),
        usage: wgpu::BufferUsages::VERTEX,
    });

    Some(LayerGpu {
        floor: layer.floor,
        kind: layer.kind,
        features: layer.features.len(),
        solid_vb,
        solid_ib,
        index_count: indices.len() as u32,
        edge_vb,
        edge_vertex_count: edges.len() as u32,
    })
}

pub fn upload_links(device: &wgpu::Device, network: &LinkNetwork) -> Option<LinkGpu> {
    let instances = segment_instances(network);
    if instances.is_empty() {
        return None;
    }

    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Pedestrian Link Instances"),
        contents: bytemuck::cast_slice(&instances),
        usage: wgpu::BufferUsages::VERTEX,
    });

    Some(LinkGpu {
        instances: buffer,
        instance_count: instances.len() as u32,
    })
}

pub fn upload_lines(device: &wgpu::Device, lines: &ContextLines) -> Option<LinesGpu> {
    let vertices = context_vertices(lines);
    if vertices.is_empty() {
        return None;
    }

    let vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Context Lines VB"),
        contents: bytemuck::cast_slice(&vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });

    Some(LinesGpu {
        vb,
        vertex_count: vertices.len() as u32,
    })
}

fn merge_bounds(a: Option<(Vec3, Vec3)>, b: Option<(Vec3, Vec3)>) -> Option<(Vec3, Vec3)> {
    match (a, b) {
        (Some((alo, ahi)), Some((blo, bhi))) => Some((alo.min(blo), ahi.max(bhi))),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Everything the renderer draws, plus the visibility flags the panel edits.
pub struct Scene {
    pub floors: FloorRegistry<LayerGpu>,
    pub links: Option<LinkGpu>,
    pub context: Option<LinesGpu>,
    pub show_links: bool,
    pub show_context: bool,
    /// Bounds of the terminal itself; context lines are left out so the
    /// initial framing stays on the building.
    bounds: Option<(Vec3, Vec3)>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            floors: FloorRegistry::default(),
            links: None,
            context: None,
            show_links: true,
            show_context: true,
            bounds: None,
        }
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads a finished load and files it under its floor or overlay.
    pub fn insert(&mut self, device: &wgpu::Device, output: LoadOutput) {
        match output {
            LoadOutput::Floor(layer) => {
                let bounds = layer.bounds();
                let Some(gpu) = upload_layer(device, &layer) else {
                    log::debug!(
                        "{} {}: no drawable features",
                        floorplan::floor::floor_label(layer.floor),
                        layer.kind
                    );
                    return;
                };
                match self.floors.insert(layer.floor, gpu) {
                    Ok(()) => self.bounds = merge_bounds(self.bounds, bounds),
                    Err(_) => log::warn!(
                        "Floor {} has no layer group; dropping its {} layer",
                        layer.floor,
                        layer.kind
                    ),
                }
            }
            LoadOutput::Network(network) => {
                self.bounds = merge_bounds(self.bounds, network.bounds());
                self.links = upload_links(device, &network);
            }
            LoadOutput::Context(lines) => {
                self.context = upload_lines(device, &lines);
            }
        }
    }

    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        self.bounds
    }

    pub fn feature_count(&self) -> usize {
        self.floors
            .iter()
            .flat_map(|g| g.layers())
            .map(|l| l.features)
            .sum()
    }

    pub fn segment_count(&self) -> u32 {
        self.links.as_ref().map_or(0, |l| l.instance_count)
    }
}
