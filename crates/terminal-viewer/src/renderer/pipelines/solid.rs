use super::{depth_state, shader_module};
use crate::data::types::{LayerGpu, MeshVertex};
use crate::renderer::shader_lib;
use anyhow::Result;

/// Translucent extruded solids. Depth is tested but not written so stacked
/// floors stay visible through each other.
pub struct SolidPipeline {
    pub pipeline: wgpu::RenderPipeline,
}

impl SolidPipeline {
    pub fn new(
        device: &wgpu::Device,
        scene_layout: &wgpu::BindGroupLayout,
        color_fmt: wgpu::TextureFormat,
        depth_fmt: wgpu::TextureFormat,
    ) -> Result<Self> {
        let shader = shader_module(device, "Solid WGSL", &shader_lib::solid_shader()?);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Solid Pipeline Layout"),
            bind_group_layouts: &[scene_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Solid Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<MeshVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x3,
                        2 => Float32x4,
                    ],
                }],
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
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        Ok(Self { pipeline })
    }

    pub fn draw_layer<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>, layer: &'a LayerGpu) {
        rpass.set_pipeline(&self.pipeline);
        rpass.set_vertex_buffer(0, layer.solid_vb.slice(..));
        rpass.set_index_buffer(layer.solid_ib.slice(..), wgpu::IndexFormat::Uint32);
        rpass.draw_indexed(0..layer.index_count, 0, 0..1);
    }
}
