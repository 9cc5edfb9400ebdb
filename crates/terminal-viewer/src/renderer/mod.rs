//! The main rendering orchestrator. Owns the GPU context, the depth target,
//! the scene uniform and the pipelines.

pub mod context;
pub mod pipelines;
pub mod shader_lib;
pub mod targets;

use self::{
    context::GfxContext,
    pipelines::{edges::LinePipeline, link_line::LinkLinePipeline, solid::SolidPipeline, SceneBinding},
    targets::Targets,
};
use crate::{camera::Camera, data::types::SceneUniformStd140, data::Scene};
use std::sync::Arc;
use winit::window::Window;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.015,
    g: 0.02,
    b: 0.035,
    a: 1.0,
};

/// Light direction (towards the light) used for solid shading.
const LIGHT_DIR: [f32; 3] = [0.4, 1.0, 0.3];

/// Builds the per-frame uniform block.
pub fn scene_uniforms(
    camera: &Camera,
    time: f32,
    viewport_size: [f32; 2],
    line_width: f32,
) -> SceneUniformStd140 {
    SceneUniformStd140 {
        view_proj: camera.view_proj().to_cols_array_2d(),
        camera_pos: camera.position().to_array(),
        time,
        viewport_size,
        line_width,
        _pad0: 0.0,
        light_dir: LIGHT_DIR,
        _pad1: 0.0,
    }
}

/// Owns all rendering-related state.
pub struct Renderer {
    pub gfx: GfxContext,
    pub targets: Targets,
    pub scene_binding: SceneBinding,
    pub solid: SolidPipeline,
    pub lines: LinePipeline,
    pub links: LinkLinePipeline,
    pub egui_renderer: egui_wgpu::Renderer,
}

impl Renderer {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let gfx = GfxContext::new(window).await?;
        let color_fmt = gfx.config.format;

        let targets = Targets::new(&gfx.device, gfx.surface_size());
        let scene_binding = SceneBinding::new(&gfx.device);
        let solid = SolidPipeline::new(&gfx.device, &scene_binding.layout, color_fmt, targets.depth_fmt)?;
        let lines = LinePipeline::new(&gfx.device, &scene_binding.layout, color_fmt, targets.depth_fmt)?;
        let links = LinkLinePipeline::new(&gfx.device, &scene_binding.layout, color_fmt, targets.depth_fmt)?;

        let egui_renderer = egui_wgpu::Renderer::new(&gfx.device, color_fmt, None, 1);

        Ok(Self {
            gfx,
            targets,
            scene_binding,
            solid,
            lines,
            links,
            egui_renderer,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>, scale_factor: f64) {
        if new_size.width > 0 && new_size.height > 0 {
            self.gfx.resize(new_size, scale_factor);
            self.targets.resize(&self.gfx.device, self.gfx.surface_size());
        }
    }

    /// Draws the scene: context lines, floor outlines, translucent solids,
    /// then the pedestrian network on top.
    pub fn render(&mut self, swap_view: &wgpu::TextureView, scene: &Scene, uniforms: &SceneUniformStd140) {
        self.scene_binding.write(&self.gfx.queue, uniforms);

        let mut encoder = self
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: swap_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            // Every pipeline shares the scene layout at group 0.
            pass.set_bind_group(0, &self.scene_binding.bind_group, &[]);

            if scene.show_context {
                if let Some(context) = &scene.context {
                    self.lines.draw(&mut pass, &context.vb, context.vertex_count);
                }
            }

            for group in scene.floors.visible() {
                for layer in group.layers() {
                    self.lines.draw(&mut pass, &layer.edge_vb, layer.edge_vertex_count);
                }
            }

            for group in scene.floors.visible() {
                for layer in group.layers() {
                    self.solid.draw_layer(&mut pass, layer);
                }
            }

            if scene.show_links {
                if let Some(links) = &scene.links {
                    self.links.draw(&mut pass, links);
                }
            }
        }

        self.gfx.queue.submit(std::iter::once(encoder.finish()));
    }
}
