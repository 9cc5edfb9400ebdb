use super::{depth_state, shader_module};
use crate::data::types::{LinkGpu, SegmentInstance};
use crate::renderer::shader_lib;
use anyhow::Result;
use wgpu::util::DeviceExt;

/// Quad corners: x selects the segment end, y the side of the centerline.
pub const SEGMENT_CORNERS: [[f32; 2]; 6] = [
    [0.0, -1.0],
    [1.0, -1.0],
    [1.0, 1.0],
    [0.0, -1.0],
    [1.0, 1.0],
    [0.0, 1.0],
];

/// Thick animated dashed lines for the pedestrian network. Each segment is
/// one instance, widened to a quad in screen space.
pub struct LinkLinePipeline {
    pub pipeline: wgpu::RenderPipeline,
    quad_vb: wgpu::Buffer,
}

impl LinkLinePipeline {
    pub fn new(
        device: &wgpu::Device,
        scene_layout: &wgpu::BindGroupLayout,
        color_fmt: wgpu::TextureFormat,
        depth_fmt: wgpu::TextureFormat,
    ) -> Result<Self> {
        let shader = shader_module(device, "Link Line WGSL", &shader_lib::link_line_shader()?);

        let quad_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Link Segment Quad VB"),
            contents: bytemuck::cast_slice(&SEGMENT_CORNERS),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let vbuf_layouts = [
            // Quad corners
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<[f32; 2]>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[wgpu::VertexAttribute {
                    shader_location: 0,
                    offset: 0,
                    format: wgpu::VertexFormat::Float32x2,
                }],
            },
            // Per-segment attributes
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<SegmentInstance>() as u64,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &[
                    // start
                    wgpu::VertexAttribute {
                        shader_location: 1,
                        offset: 0,
                        format: wgpu::VertexFormat::Float32x3,
                    },
                    // distance
                    wgpu::VertexAttribute {
                        shader_location: 2,
                        offset: 12,
                        format: wgpu::VertexFormat::Float32,
                    },
                    // end
                    wgpu::VertexAttribute {
                        shader_location: 3,
                        offset: 16,
                        format: wgpu::VertexFormat::Float32x3,
                    },
                    // direction
                    wgpu::VertexAttribute {
                        shader_location: 4,
                        offset: 28,
                        format: wgpu::VertexFormat::Uint32,
                    },
                ],
            },
        ];

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Link Line Pipeline Layout"),
            bind_group_layouts: &[scene_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Link Line Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &vbuf_layouts,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(depth_state(depth_fmt, false)),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_fmt,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        Ok(Self { pipeline, quad_vb })
    }

    pub fn draw<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>, links: &'a LinkGpu) {
        rpass.set_pipeline(&self.pipeline);
        rpass.set_vertex_buffer(0, self.quad_vb.slice(..));
        rpass.set_vertex_buffer(1, links.instances.slice(..));
        rpass.draw(0..SEGMENT_CORNERS.len() as u32, 0..links.instance_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_offsets_match_layout() {
        assert_eq!(std::mem::offset_of!(SegmentInstance, distance), 12);
        assert_eq!(std::mem::offset_of!(SegmentInstance, end), 16);
        assert_eq!(std::mem::offset_of!(SegmentInstance, direction), 28);
    }

    #[test]
    fn test_quad_covers_both_ends_and_sides() {
        for (x, y) in [(0.0, -1.0), (0.0, 1.0), (1.0, -1.0), (1.0, 1.0)] {
            assert!(SEGMENT_CORNERS.contains(&[x, y]));
        }
    }
}
