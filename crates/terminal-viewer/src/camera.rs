use glam::{Mat4, Vec3};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

const FOV_Y_DEG: f32 = 50.0;
const NEAR: f32 = 1.0;
const FAR: f32 = 100_000.0;

pub const MIN_RADIUS: f32 = 10.0;
pub const MAX_RADIUS: f32 = 20_000.0;

/// Orbit camera in the Y-up scene frame.
#[derive(Debug, Clone)]
pub struct Camera {
    /// The point the camera orbits around.
    pub target: Vec3,
    /// Distance from the camera to the target.
    pub radius: f32,
    /// Angle around +Y, zero looking down -Z.
    pub azimuth_rad: f32,
    /// Angle above the ground plane.
    pub elevation_rad: f32,
    pub aspect: f32,

    position: Vec3,
}

impl Camera {
    pub fn new(aspect: f32) -> Self {
        let mut camera = Self {
            target: Vec3::ZERO,
            radius: 1500.0,
            azimuth_rad: 30.0f32.to_radians(),
            elevation_rad: 35.0f32.to_radians(),
            aspect,
            position: Vec3::ZERO,
        };
        camera.update();
        camera
    }

    /// Recomputes the eye position. Call after changing orbit parameters.
    pub fn update(&mut self) {
        let (sin_az, cos_az) = self.azimuth_rad.sin_cos();
        let (sin_el, cos_el) = self.elevation_rad.sin_cos();
        let offset = Vec3::new(
            self.radius * cos_el * sin_az,
            self.radius * sin_el,
            self.radius * cos_el * cos_az,
        );
        self.position = self.target + offset;
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Keeps the aspect ratio in step with the surface.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    /// Right-handed perspective with depth in [0, 1].
    pub fn proj(&self) -> Mat4 {
        Mat4::perspective_rh(FOV_Y_DEG.to_radians(), self.aspect, NEAR, FAR)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.proj() * self.view()
    }

    /// Rotates around the target; `dx`, `dy` in pixels.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.azimuth_rad -= dx * 0.005;
        self.elevation_rad = (self.elevation_rad + dy * 0.005)
            .clamp(2.0f32.to_radians(), 89.0f32.to_radians());
        self.update();
    }

    /// Slides the target over the ground plane; `dx`, `dy` in pixels.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let (sin_az, cos_az) = self.azimuth_rad.sin_cos();
        let right = Vec3::new(cos_az, 0.0, -sin_az);
        let forward = Vec3::new(-sin_az, 0.0, -cos_az);
        let scale = self.radius * 0.0015;

        self.target += (-right * dx + forward * dy) * scale;
        self.update();
    }

    /// Positive `scroll` zooms in.
    pub fn zoom(&mut self, scroll: f32) {
        self.radius = (self.radius * 1.1f32.powf(-scroll)).clamp(MIN_RADIUS, MAX_RADIUS);
        self.update();
    }

    /// Centers the orbit on a bounding box and backs off until it fits.
    pub fn frame_bounds(&mut self, lo: Vec3, hi: Vec3) {
        let center = (lo + hi) * 0.5;
        let half_diag = (hi - lo).length() * 0.5;
        let fit = half_diag / (FOV_Y_DEG.to_radians() * 0.5).tan();

        self.target = center;
        self.radius = (fit * 1.1).clamp(MIN_RADIUS, MAX_RADIUS);
        self.update();
    }
}

/// Mouse bindings: left-drag orbits, right-drag pans, wheel zooms.
#[derive(Debug, Default)]
pub struct CameraController {
    orbiting: bool,
    panning: bool,
    last_mouse: Option<(f64, f64)>,
}

impl CameraController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_event(&mut self, event: &WindowEvent, camera: &mut Camera) {
        match event {
            WindowEvent::MouseInput { button, state, .. } => {
                let pressed = *state == ElementState::Pressed;
                match button {
                    MouseButton::Left => self.orbiting = pressed,
                    MouseButton::Right => self.panning = pressed,
                    _ => {}
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let xy = (position.x, position.y);
                if let Some(last) = self.last_mouse {
                    let dx = (xy.0 - last.0) as f32;
                    let dy = (xy.1 - last.1) as f32;
                    if self.orbiting {
                        camera.orbit(dx, dy);
                    } else if self.panning {
                        camera.pan(dx, dy);
                    }
                }
                self.last_mouse = Some(xy);
            }
            WindowEvent::CursorLeft { .. } => {
                self.last_mouse = None;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 120.0,
                };
                camera.zoom(scroll);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_eye_at_radius_above_ground() {
        let camera = Camera::new(16.0 / 9.0);
        assert_relative_eq!(camera.position().distance(camera.target), 1500.0, epsilon = 1e-2);
        assert!(camera.position().y > 0.0);
    }

    #[test]
    fn test_target_projects_to_center() {
        let mut camera = Camera::new(1.5);
        camera.target = Vec3::new(100.0, 20.0, -40.0);
        camera.update();
        let clip = camera.view_proj() * camera.target.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert_relative_eq!(ndc.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(ndc.y, 0.0, epsilon = 1e-4);
        assert!((0.0..=1.0).contains(&ndc.z));
    }

    #[test]
    fn test_elevation_and_zoom_are_clamped() {
        let mut camera = Camera::new(1.0);
        camera.orbit(0.0, 100_000.0);
        assert!(camera.elevation_rad <= 89.0f32.to_radians() + 1e-6);
        camera.orbit(0.0, -100_000.0);
        assert!(camera.elevation_rad >= 2.0f32.to_radians() - 1e-6);

        for _ in 0..200 {
            camera.zoom(5.0);
        }
        assert_relative_eq!(camera.radius, MIN_RADIUS);
        for _ in 0..200 {
            camera.zoom(-5.0);
        }
        assert_relative_eq!(camera.radius, MAX_RADIUS);
    }

    #[test]
    fn test_pan_stays_on_ground_plane() {
        let mut camera = Camera::new(1.0);
        let before = camera.target;
        let offset = camera.position() - camera.target;
        camera.pan(40.0, -25.0);
        assert_relative_eq!(camera.target.y, before.y);
        assert!(camera.target.distance(before) > 0.0);
        // Panning translates the whole rig
        assert!((camera.position() - camera.target).abs_diff_eq(offset, 1e-2));
    }

    #[test]
    fn test_frame_bounds() {
        let mut camera = Camera::new(1.0);
        let (lo, hi) = (Vec3::new(-200.0, -91.0, -300.0), Vec3::new(400.0, 125.0, 100.0));
        camera.frame_bounds(lo, hi);
        assert_eq!(camera.target, (lo + hi) * 0.5);
        assert!(camera.radius > (hi - lo).length() * 0.5);
        assert!(camera.radius <= MAX_RADIUS);
    }
}
