//! GPU-side data layouts shared by the pipelines and the WGSL fragments.

use floorplan::{FeatureKind, FloorIndex};

/// Vertex of an extruded solid. Matches `SolidIn` in the solid shader.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Debug, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

/// Vertex of a thin line list (edge outlines, context lines).
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Debug, PartialEq)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

/// One pedestrian link segment, expanded to a screen-space quad in the
/// vertex stage. Every corner of the quad sees the same `distance` and
/// `direction`.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Debug, PartialEq)]
pub struct SegmentInstance {
    pub start: [f32; 3],
    /// Segment length; scales the dash pattern.
    pub distance: f32,
    pub end: [f32; 3],
    /// 0 both ways, 1 forward, 2 backward.
    pub direction: u32,
}

/// Per-frame scene uniform, std140. Matches `SceneUniforms` in WGSL.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Debug)]
pub struct SceneUniformStd140 {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 3],
    /// Animation clock, advanced once per rendered frame.
    pub time: f32,
    /// Surface size in physical pixels.
    pub viewport_size: [f32; 2],
    /// Link line width in physical pixels.
    pub line_width: f32,
    pub _pad0: f32,
    pub light_dir: [f32; 3],
    pub _pad1: f32,
}

const _: [(); 112] = [(); core::mem::size_of::<SceneUniformStd140>()];
const _: [(); 32] = [(); core::mem::size_of::<SegmentInstance>()];

/// Solids and outline of one floor layer, resident on the GPU.
#[derive(Debug)]
pub struct LayerGpu {
    pub floor: FloorIndex,
    pub kind: FeatureKind,
    pub features: usize,

    pub solid_vb: wgpu::Buffer,
    pub solid_ib: wgpu::Buffer,
    pub index_count: u32,

    /// `LineVertex` pairs, drawn as a line list.
    pub edge_vb: wgpu::Buffer,
    pub edge_vertex_count: u32,
}

/// The whole pedestrian network as one instance buffer.
#[derive(Debug)]
pub struct LinkGpu {
    pub instances: wgpu::Buffer,
    pub instance_count: u32,
}

/// A plain line list, used for the context lines.
#[derive(Debug)]
pub struct LinesGpu {
    pub vb: wgpu::Buffer,
    pub vertex_count: u32,
}
