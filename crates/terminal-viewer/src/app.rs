use crate::{
    camera::{Camera, CameraController},
    config::ViewerArgs,
    data::Scene,
    loader::Loader,
    renderer::{scene_uniforms, Renderer},
    ui,
};
use anyhow::Result;
use floorplan::Manifest;
use std::sync::Arc;
use winit::{event::WindowEvent, window::Window};

/// Animation clock advance per rendered frame.
pub const TIME_STEP: f32 = 0.02;

pub struct App {
    pub renderer: Renderer,
    pub camera: Camera,
    pub camera_controller: CameraController,
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    pub scene: Scene,
    pub loader: Loader,
    /// Shared `time` uniform of the link shader.
    pub time: f32,
    line_width: f32,
    panel_open_by_default: bool,
}

impl App {
    pub async fn new(window: Arc<Window>, args: &ViewerArgs) -> Result<Self> {
        let renderer = Renderer::new(window.clone()).await?;
        let size = renderer.gfx.surface_size();

        let camera = Camera::new(size.width as f32 / size.height.max(1) as f32);
        let camera_controller = CameraController::new();

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            &*window,
            None,
            None,
        );

        let logical_width = window.inner_size().to_logical::<f32>(window.scale_factor()).width;

        let config = args.dataset_config();
        let manifest = if args.discover {
            Manifest::discover(&config)?
        } else {
            Manifest::standard(&config)?
        };
        if !manifest.rejected.is_empty() {
            log::debug!("{} files did not match a floor token", manifest.rejected.len());
        }
        let loader = Loader::spawn(manifest, config);

        Ok(Self {
            renderer,
            camera,
            camera_controller,
            egui_ctx,
            egui_state,
            scene: Scene::new(),
            loader,
            time: 0.0,
            line_width: args.line_width,
            panel_open_by_default: ui::panel_starts_open(logical_width),
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>, scale_factor: f64) {
        if new_size.width > 0 && new_size.height > 0 {
            self.renderer.resize(new_size, scale_factor);
            let surface = self.renderer.gfx.surface_size();
            self.camera.set_viewport(surface.width, surface.height);
        }
    }

    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        let response = self.egui_state.on_window_event(window, event);
        if response.consumed {
            return true;
        }

        self.camera_controller.handle_event(event, &mut self.camera);

        match event {
            WindowEvent::Resized(physical_size) => {
                self.resize(*physical_size, window.scale_factor());
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.resize(window.inner_size(), *scale_factor);
            }
            _ => {}
        }

        false
    }

    /// Moves finished loads into the scene. Frames the camera once, when the
    /// last load has resolved.
    fn drain_loads(&mut self) {
        for event in self.loader.poll() {
            if let Ok(output) = event.result {
                self.scene.insert(&self.renderer.gfx.device, output);
            }
        }

        if self.loader.take_finished() {
            match self.scene.bounds() {
                Some((lo, hi)) => self.camera.frame_bounds(lo, hi),
                None => log::warn!("No geometry loaded"),
            }
        }
    }

    pub fn render(&mut self, window: &Window) -> Result<(), wgpu::SurfaceError> {
        self.drain_loads();

        let frame = self.renderer.gfx.surface.get_current_texture()?;
        let swap_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let surface = self.renderer.gfx.surface_size();
        let uniforms = scene_uniforms(
            &self.camera,
            self.time,
            [surface.width as f32, surface.height as f32],
            self.line_width * self.renderer.gfx.pixel_ratio,
        );
        self.time += TIME_STEP;

        self.renderer.render(&swap_view, &self.scene, &uniforms);

        let egui_input = self.egui_state.take_egui_input(window);
        self.egui_ctx.begin_frame(egui_input);

        ui::draw_layer_panel(
            &self.egui_ctx,
            self.panel_open_by_default,
            &mut self.scene.floors,
            &mut self.scene.show_links,
            &mut self.scene.show_context,
        );
        ui::draw_loading(&self.egui_ctx, self.loader.tracker());
        ui::draw_hud(
            &self.egui_ctx,
            ui::HudStats {
                floors_populated: self.scene.floors.populated(),
                features: self.scene.feature_count(),
                link_segments: self.scene.segment_count(),
            },
        );

        let egui_output = self.egui_ctx.end_frame();
        self.egui_state
            .handle_platform_output(window, egui_output.platform_output);

        // egui lays out in logical points; the surface may be below native
        // resolution when the pixel ratio is capped.
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [surface.width, surface.height],
            pixels_per_point: self.renderer.gfx.pixel_ratio,
        };
        let shapes = self
            .egui_ctx
            .tessellate(egui_output.shapes, screen_descriptor.pixels_per_point);

        let mut encoder = self
            .renderer
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("UI Encoder"),
            });

        for (id, delta) in &egui_output.textures_delta.set {
            self.renderer.egui_renderer.update_texture(
                &self.renderer.gfx.device,
                &self.renderer.gfx.queue,
                *id,
                delta,
            );
        }

        self.renderer.egui_renderer.update_buffers(
            &self.renderer.gfx.device,
            &self.renderer.gfx.queue,
            &mut encoder,
            &shapes,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("EGUI Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &swap_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.renderer
                .egui_renderer
                .render(&mut render_pass, &shapes, &screen_descriptor);
        }

        for id in &egui_output.textures_delta.free {
            self.renderer.egui_renderer.free_texture(id);
        }

        self.renderer
            .gfx
            .queue
            .submit(std::iter::once(encoder.finish()));
        frame.present();

        Ok(())
    }
}
