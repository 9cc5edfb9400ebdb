use anyhow::{anyhow, Result};
use std::sync::Arc;
use winit::dpi::PhysicalSize;
use winit::window::Window;

/// Highest device pixel ratio the scene is rendered at.
pub const MAX_PIXEL_RATIO: f64 = 2.0;

/// Surface size for a window of `physical` pixels at `scale_factor`. Above
/// the cap the surface is rendered smaller and stretched by the compositor.
pub fn capped_surface_size(physical: PhysicalSize<u32>, scale_factor: f64) -> PhysicalSize<u32> {
    let width = physical.width.max(1);
    let height = physical.height.max(1);
    if scale_factor.is_nan() || scale_factor <= MAX_PIXEL_RATIO {
        return PhysicalSize::new(width, height);
    }

    let k = MAX_PIXEL_RATIO / scale_factor;
    PhysicalSize::new(
        ((width as f64 * k).round() as u32).max(1),
        ((height as f64 * k).round() as u32).max(1),
    )
}

/// Effective pixels per logical point after the cap.
#[inline]
pub fn capped_pixel_ratio(scale_factor: f64) -> f32 {
    scale_factor.min(MAX_PIXEL_RATIO) as f32
}

/// Holds all GPU resources needed for rendering.
pub struct GfxContext {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    /// Window size in physical pixels (uncapped).
    pub size: PhysicalSize<u32>,
    pub pixel_ratio: f32,
}

impl GfxContext {
    /// Creates a new graphics context bound to the given window.
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();
        let scale_factor = window.scale_factor();
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());

        // The surface must outlive the window; `Arc` guarantees this.
        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow!("Failed to find a suitable GPU adapter."))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await?;

        // Prefer an sRGB surface.
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| anyhow!("Surface reports no supported formats."))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_size = capped_surface_size(size, scale_factor);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: surface_size.width,
            height: surface_size.height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        log::info!(
            "Surface {}x{} ({:?}), window scale {:.2}",
            config.width,
            config.height,
            config.format,
            scale_factor
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            pixel_ratio: capped_pixel_ratio(scale_factor),
        })
    }

    /// Size of the render targets in pixels.
    #[inline]
    pub fn surface_size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.config.width, self.config.height)
    }

    /// Reconfigures the swap chain for a new window size or scale factor.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>, scale_factor: f64) {
        if new_size.width > 0 && new_size.height > 0 {
            let surface_size = capped_surface_size(new_size, scale_factor);
            self.size = new_size;
            self.pixel_ratio = capped_pixel_ratio(scale_factor);
            self.config.width = surface_size.width;
            self.config.height = surface_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_ratio_is_capped_at_two() {
        // 1280x720 logical at ratio 3
        let size = capped_surface_size(PhysicalSize::new(3840, 2160), 3.0);
        assert_eq!(size, PhysicalSize::new(2560, 1440));
        assert_eq!(capped_pixel_ratio(3.0), 2.0);
    }

    #[test]
    fn test_low_ratios_render_at_full_size() {
        assert_eq!(
            capped_surface_size(PhysicalSize::new(2560, 1440), 2.0),
            PhysicalSize::new(2560, 1440)
        );
        assert_eq!(
            capped_surface_size(PhysicalSize::new(1280, 720), 1.0),
            PhysicalSize::new(1280, 720)
        );
        assert_eq!(capped_pixel_ratio(1.25), 1.25);
    }

    #[test]
    fn test_zero_size_is_clamped() {
        assert_eq!(capped_surface_size(PhysicalSize::new(0, 0), 3.0), PhysicalSize::new(1, 1));
    }
}
