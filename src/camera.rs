//! Orbit camera, perspective projection and the mouse controller driving them.
//!
//! The camera circles a target point: `yaw` turns around the world Y axis and
//! `pitch` lifts the eye above the horizon. With both at zero the eye sits on
//! the positive Z axis looking towards `-Z`.

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};
use instant::Duration;
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

// Keeps the eye off the poles where the up vector would flip.
const MAX_PITCH: f32 = std::f32::consts::FRAC_PI_2 - 0.01;
const MIN_DISTANCE: f32 = 0.1;
const MAX_DISTANCE: f32 = 500.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub target: Point3<f32>,
    pub distance: f32,
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
}

impl Camera {
    pub fn new<T: Into<Point3<f32>>, Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        target: T,
        distance: f32,
        yaw: Y,
        pitch: P,
    ) -> Self {
        Self {
            target: target.into(),
            distance: distance.clamp(MIN_DISTANCE, MAX_DISTANCE),
            yaw: yaw.into(),
            pitch: pitch.into(),
        }
    }

    /// Places the camera at `eye`, orbiting around `target`.
    pub fn looking_at<E: Into<Point3<f32>>, T: Into<Point3<f32>>>(eye: E, target: T) -> Self {
        let eye = eye.into();
        let target = target.into();
        let offset = eye - target;
        let distance = offset.magnitude();
        if distance <= f32::EPSILON {
            return Self::new(target, MIN_DISTANCE, Rad(0.0), Rad(0.0));
        }
        let pitch = (offset.y / distance).clamp(-1.0, 1.0).asin();
        let yaw = offset.x.atan2(offset.z);
        Self::new(target, distance, Rad(yaw), Rad(pitch))
    }

    pub fn eye(&self) -> Point3<f32> {
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
        self.target
            + Vector3::new(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw) * self.distance
    }

    /// Unit vector from the eye towards the target.
    pub fn forward(&self) -> Vector3<f32> {
        (self.target - self.eye()).normalize()
    }

    pub fn right(&self) -> Vector3<f32> {
        self.forward().cross(Vector3::unit_y()).normalize()
    }

    pub fn up(&self) -> Vector3<f32> {
        self.right().cross(self.forward()).normalize()
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.eye(), self.target, Vector3::unit_y())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn znear(&self) -> f32 {
        self.znear
    }

    pub fn zfar(&self) -> f32 {
        self.zfar
    }

    /// Projection in OpenGL clip space (`z` in `[-1, 1]`). Used for unprojecting picks.
    pub fn calc_gl_matrix(&self) -> Matrix4<f32> {
        perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * self.calc_gl_matrix()
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
    // Billboard axes for point sprites
    right: [f32; 4],
    up: [f32; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
            right: [1.0, 0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0, 0.0],
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.eye().to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
        self.right = camera.right().extend(0.0).into();
        self.up = camera.up().extend(0.0).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Drag {
    Orbit,
    Pan,
}

/// Mouse driven orbit controls.
///
/// Left drag orbits around the target, right drag pans the target, and the
/// wheel moves the eye towards or away from the target. Input is collected in
/// [`handle_window_events`](Self::handle_window_events) and applied once per
/// frame in [`update`](Self::update).
#[derive(Debug)]
pub struct CameraController {
    rotate_speed: f32,
    zoom_speed: f32,
    pan_speed: f32,
    drag: Option<Drag>,
    last_cursor: Option<PhysicalPosition<f64>>,
    rotate_horizontal: f32,
    rotate_vertical: f32,
    pan_horizontal: f32,
    pan_vertical: f32,
    scroll: f32,
}

impl CameraController {
    pub fn new(rotate_speed: f32, zoom_speed: f32, pan_speed: f32) -> Self {
        Self {
            rotate_speed,
            zoom_speed,
            pan_speed,
            drag: None,
            last_cursor: None,
            rotate_horizontal: 0.0,
            rotate_vertical: 0.0,
            pan_horizontal: 0.0,
            pan_vertical: 0.0,
            scroll: 0.0,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Returns whether the event changed the controller.
    pub fn handle_window_events(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                let drag = match button {
                    MouseButton::Left => Drag::Orbit,
                    MouseButton::Right => Drag::Pan,
                    _ => return false,
                };
                match state {
                    ElementState::Pressed => self.drag = Some(drag),
                    ElementState::Released if self.drag == Some(drag) => self.drag = None,
                    ElementState::Released => return false,
                }
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                let previous = self.last_cursor.replace(*position);
                let (Some(drag), Some(previous)) = (self.drag, previous) else {
                    return false;
                };
                let dx = (position.x - previous.x) as f32;
                let dy = (position.y - previous.y) as f32;
                match drag {
                    Drag::Orbit => {
                        self.rotate_horizontal += dx;
                        self.rotate_vertical += dy;
                    }
                    Drag::Pan => {
                        self.pan_horizontal += dx;
                        self.pan_vertical += dy;
                    }
                }
                true
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll += match delta {
                    MouseScrollDelta::LineDelta(_, lines) => *lines,
                    // assume 50 pixels per line
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 50.0,
                };
                true
            }
            WindowEvent::CursorLeft { .. } => {
                self.last_cursor = None;
                false
            }
            _ => false,
        }
    }

    /// Applies the input gathered since the last frame.
    ///
    /// Rotation and panning follow the pointer one to one, so `dt` only
    /// matters for keeping the signature aligned with time based controllers.
    pub fn update(&mut self, camera: &mut Camera, _dt: Duration) {
        camera.yaw -= Rad(self.rotate_horizontal * self.rotate_speed);
        camera.pitch += Rad(self.rotate_vertical * self.rotate_speed);
        camera.pitch = Rad(camera.pitch.0.clamp(-MAX_PITCH, MAX_PITCH));

        if self.pan_horizontal != 0.0 || self.pan_vertical != 0.0 {
            let scale = camera.distance * self.pan_speed;
            let offset = camera.right() * (-self.pan_horizontal * scale)
                + camera.up() * (self.pan_vertical * scale);
            camera.target += offset;
        }

        if self.scroll != 0.0 {
            camera.distance = (camera.distance * self.zoom_speed.powf(self.scroll))
                .clamp(MIN_DISTANCE, MAX_DISTANCE);
        }

        self.rotate_horizontal = 0.0;
        self.rotate_vertical = 0.0;
        self.pan_horizontal = 0.0;
        self.pan_vertical = 0.0;
        self.scroll = 0.0;
    }
}

#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: CameraController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    /// Recomputes the uniform from the camera and uploads it.
    pub fn write_to_buffer(&mut self, queue: &wgpu::Queue, projection: &Projection) {
        self.uniform.update_view_proj(&self.camera, projection);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{Deg, MetricSpace};

    use super::*;

    #[test]
    fn default_view_sits_on_positive_z() {
        let camera = Camera::looking_at((0.0, 0.0, 4.0), (0.0, 0.0, 0.0));
        assert!(camera.eye().distance(Point3::new(0.0, 0.0, 4.0)) < 1e-5);
        assert!((camera.forward() - Vector3::new(0.0, 0.0, -1.0)).magnitude() < 1e-5);
        assert!((camera.right() - Vector3::unit_x()).magnitude() < 1e-5);
        assert!((camera.up() - Vector3::unit_y()).magnitude() < 1e-5);
    }

    #[test]
    fn looking_at_round_trips_the_eye() {
        let camera = Camera::looking_at((3.0, 2.0, -1.0), (1.0, 0.0, 0.0));
        assert!(camera.eye().distance(Point3::new(3.0, 2.0, -1.0)) < 1e-4);
    }

    #[test]
    fn resize_updates_aspect_and_ignores_zero_height() {
        let mut projection = Projection::new(800, 600, Deg(75.0), 0.1, 1000.0);
        projection.resize(1000, 500);
        assert_eq!(projection.aspect(), 2.0);
        projection.resize(1000, 0);
        assert_eq!(projection.aspect(), 2.0);
    }

    #[test]
    fn wheel_zooms_and_left_drag_orbits() {
        let mut camera = Camera::looking_at((0.0, 0.0, 4.0), (0.0, 0.0, 0.0));
        let mut controller = CameraController::new(0.01, 0.95, 0.001);

        controller.handle_window_events(&WindowEvent::MouseWheel {
            device_id: winit::event::DeviceId::dummy(),
            delta: MouseScrollDelta::LineDelta(0.0, 1.0),
            phase: winit::event::TouchPhase::Moved,
        });
        controller.update(&mut camera, Duration::from_millis(16));
        assert!((camera.distance - 3.8).abs() < 1e-5);

        controller.drag = Some(Drag::Orbit);
        controller.last_cursor = Some(PhysicalPosition::new(100.0, 100.0));
        controller.handle_window_events(&WindowEvent::CursorMoved {
            device_id: winit::event::DeviceId::dummy(),
            position: PhysicalPosition::new(110.0, 100.0),
        });
        controller.update(&mut camera, Duration::from_millis(16));
        assert!((camera.yaw.0 + 0.1).abs() < 1e-5);
        assert_eq!(camera.pitch, Rad(0.0));
    }
}
