//! Orbit controls: pointer driven rotation, panning and dolly around a target.
//!
//! Input handlers only accumulate deltas. Nothing touches the camera until
//! [`OrbitControls::update`] runs, which the animation loop calls once per frame.
//! `update` re-derives the orbit from the camera's current position, so a
//! position written by the scroll driver in between frames is honoured.

use cgmath::{InnerSpace, Point3, Vector3, Zero};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::ModifiersState;

use crate::{camera::PerspectiveCamera, config::OrbitConfig};

const EPS: f32 = 1e-6;
/// Pixels per wheel "line" for trackpads reporting pixel deltas.
const PIXELS_PER_LINE: f64 = 100.0;

/// Spherical coordinates with +Y up: `theta` around Y from +Z, `phi` from +Y.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    pub phi: f32,
    pub theta: f32,
}

impl Spherical {
    pub fn from_offset(offset: Vector3<f32>) -> Self {
        let radius = offset.magnitude();
        if radius <= EPS {
            return Self {
                radius: 0.0,
                phi: 0.0,
                theta: 0.0,
            };
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    pub fn to_offset(self) -> Vector3<f32> {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vector3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }

    /// Keep `phi` away from the poles so the up vector stays well defined.
    pub fn make_safe(mut self) -> Self {
        self.phi = self.phi.clamp(EPS, std::f32::consts::PI - EPS);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Drag {
    Rotate,
    Pan,
    None,
}

#[derive(Debug)]
pub struct OrbitControls {
    pub target: Point3<f32>,
    pub enabled: bool,
    pub enable_rotate: bool,
    pub enable_pan: bool,
    pub enable_zoom: bool,
    config: OrbitConfig,
    drag: Drag,
    last_pointer: Option<(f64, f64)>,
    modifiers: ModifiersState,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
    pan_offset: Vector3<f32>,
}

impl OrbitControls {
    pub fn new(config: OrbitConfig) -> Self {
        Self {
            target: Point3::new(0.0, 0.0, 0.0),
            enabled: true,
            enable_rotate: true,
            enable_pan: true,
            enable_zoom: true,
            config,
            drag: Drag::None,
            last_pointer: None,
            modifiers: ModifiersState::empty(),
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            pan_offset: Vector3::zero(),
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag != Drag::None
    }

    pub fn pointer_down(&mut self, button: MouseButton) {
        if !self.enabled {
            return;
        }
        self.drag = match button {
            MouseButton::Left if self.enable_rotate => Drag::Rotate,
            MouseButton::Right | MouseButton::Middle if self.enable_pan => Drag::Pan,
            _ => Drag::None,
        };
    }

    pub fn pointer_up(&mut self) {
        self.drag = Drag::None;
    }

    /// Track the cursor. Deltas are scaled by the viewport height so a drag
    /// across the full height is one `rotate_speed` of rotation.
    pub fn pointer_move(&mut self, x: f64, y: f64, camera: &PerspectiveCamera, viewport_height: u32) {
        let previous = self.last_pointer.replace((x, y));
        let Some((px, py)) = previous else {
            return;
        };
        let height = viewport_height.max(1) as f32;
        let dx = (x - px) as f32;
        let dy = (y - py) as f32;
        match self.drag {
            Drag::Rotate => {
                self.rotate_left(self.config.rotate_speed * dx / height);
                self.rotate_up(self.config.rotate_speed * dy / height);
            }
            Drag::Pan => self.pan(dx, dy, camera, height),
            Drag::None => (),
        }
    }

    /// Positive `lines` (wheel pushed away) dollies towards the target.
    pub fn wheel(&mut self, lines: f32) {
        if !self.enabled || !self.enable_zoom || lines == 0.0 {
            return;
        }
        let step = self.config.zoom_step.powf(lines.abs());
        if lines > 0.0 {
            self.scale *= step;
        } else {
            self.scale /= step;
        }
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.delta_theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.delta_phi -= angle;
    }

    fn pan(&mut self, dx: f32, dy: f32, camera: &PerspectiveCamera, height: f32) {
        let offset = camera.position - self.target_vec();
        // world units visible across half the viewport at the target's depth
        let half_fov = (camera.projection.fovy / 2.0).to_radians();
        let target_distance = offset.magnitude() * half_fov.tan();
        let forward = -offset.normalize();
        if !forward.x.is_finite() {
            return;
        }
        let right = forward.cross(camera.up).normalize();
        let up = right.cross(forward);
        let speed = self.config.pan_speed;
        self.pan_offset += right * (-2.0 * dx * target_distance / height * speed);
        self.pan_offset += up * (2.0 * dy * target_distance / height * speed);
    }

    /// Feed a winit window event. Returns true when the event was consumed.
    ///
    /// Plain wheel input is left to the page scroll; `Ctrl` + wheel zooms.
    pub fn handle_window_event(
        &mut self,
        event: &WindowEvent,
        camera: &PerspectiveCamera,
        viewport_height: u32,
    ) -> bool {
        match event {
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
                false
            }
            WindowEvent::MouseInput { state, button, .. } => {
                match state {
                    ElementState::Pressed => self.pointer_down(*button),
                    ElementState::Released => self.pointer_up(),
                }
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.pointer_move(position.x, position.y, camera, viewport_height);
                self.is_dragging()
            }
            WindowEvent::CursorLeft { .. } => {
                self.last_pointer = None;
                self.pointer_up();
                false
            }
            WindowEvent::MouseWheel { delta, .. } if self.modifiers.control_key() => {
                self.wheel(wheel_lines(delta));
                true
            }
            _ => false,
        }
    }

    /// Apply the accumulated input to the camera. Returns true if it moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        // Leave positions set elsewhere (scroll) untouched without input.
        if self.is_idle() {
            return false;
        }
        let before = camera.position;
        let offset = camera.position - self.target_vec();
        let mut spherical = Spherical::from_offset(offset);

        let factor = self.config.damping.unwrap_or(1.0);
        spherical.theta += self.delta_theta * factor;
        spherical.phi += self.delta_phi * factor;
        let mut spherical = spherical.make_safe();
        spherical.radius = (spherical.radius * self.scale)
            .clamp(self.config.min_distance, self.config.max_distance);

        self.target += self.pan_offset * factor;
        camera.position = self.target_vec() + spherical.to_offset();
        camera.target = self.target;

        match self.config.damping {
            Some(damping) => {
                self.delta_theta *= 1.0 - damping;
                self.delta_phi *= 1.0 - damping;
                self.pan_offset *= 1.0 - damping;
                if self.delta_theta.abs() < EPS
                    && self.delta_phi.abs() < EPS
                    && self.pan_offset.magnitude2() < EPS * EPS
                {
                    self.delta_theta = 0.0;
                    self.delta_phi = 0.0;
                    self.pan_offset = Vector3::zero();
                }
            }
            None => {
                self.delta_theta = 0.0;
                self.delta_phi = 0.0;
                self.pan_offset = Vector3::zero();
            }
        }
        self.scale = 1.0;

        (camera.position - before).magnitude2() > EPS
    }

    fn is_idle(&self) -> bool {
        self.delta_theta == 0.0
            && self.delta_phi == 0.0
            && self.pan_offset == Vector3::zero()
            && self.scale == 1.0
    }

    fn target_vec(&self) -> Vector3<f32> {
        Vector3::new(self.target.x, self.target.y, self.target.z)
    }
}

pub fn wheel_lines(delta: &MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => *y,
        MouseScrollDelta::PixelDelta(position) => (position.y / PIXELS_PER_LINE) as f32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{camera::Projection, config::SceneConfig};
    use std::f32::consts::{FRAC_PI_2, PI};

    fn camera_at(position: [f32; 3]) -> PerspectiveCamera {
        PerspectiveCamera::new(position, Projection::new(800, 600, 75.0, 0.1, 1000.0))
    }

    fn controls() -> OrbitControls {
        OrbitControls::new(SceneConfig::default().orbit)
    }

    #[test]
    fn update_without_input_keeps_the_camera_still() {
        let mut camera = camera_at([0.0, 0.0, 30.0]);
        let mut controls = controls();
        assert!(!controls.update(&mut camera));
        assert!((camera.position - Vector3::new(0.0, 0.0, 30.0)).magnitude() < 1e-4);
    }

    #[test]
    fn idle_updates_never_drift_the_camera() {
        let start = Vector3::new(0.2468, 0.2468, 12.34);
        let mut camera = camera_at([start.x, start.y, start.z]);
        let mut controls = controls();
        for _ in 0..10_000 {
            controls.update(&mut camera);
        }
        assert_eq!(camera.position, start);
    }

    #[test]
    fn damped_input_settles_to_idle() {
        let mut config = SceneConfig::default().orbit;
        config.damping = Some(0.25);
        let mut controls = OrbitControls::new(config);
        let mut camera = camera_at([0.0, 0.0, 30.0]);
        controls.rotate_left(0.4);
        for _ in 0..200 {
            controls.update(&mut camera);
        }
        let settled = camera.position;
        assert!(!controls.update(&mut camera));
        assert_eq!(camera.position, settled);
    }

    #[test]
    fn rotation_keeps_distance_to_target() {
        let mut camera = camera_at([0.0, 0.0, 30.0]);
        let mut controls = controls();
        controls.rotate_left(FRAC_PI_2);
        assert!(controls.update(&mut camera));
        assert!((camera.position.magnitude() - 30.0).abs() < 1e-3);
        // a quarter turn to the left puts the camera on the -X axis
        assert!((camera.position.x + 30.0).abs() < 1e-3);
    }

    #[test]
    fn polar_angle_is_clamped_at_the_poles() {
        let mut camera = camera_at([0.0, 0.0, 30.0]);
        let mut controls = controls();
        controls.rotate_up(PI);
        controls.update(&mut camera);
        assert!(camera.position.x.is_finite() && camera.position.z.is_finite());
        assert!(camera.position.y > 29.9);
        assert!(camera.position.y <= 30.0 + 1e-4);
    }

    #[test]
    fn undamped_input_is_applied_once() {
        let mut camera = camera_at([0.0, 0.0, 30.0]);
        let mut controls = controls();
        controls.rotate_left(0.3);
        controls.update(&mut camera);
        let after_first = camera.position;
        assert!(!controls.update(&mut camera));
        assert!((camera.position - after_first).magnitude() < 1e-4);
    }

    #[test]
    fn damped_input_eases_out_over_several_frames() {
        let mut config = SceneConfig::default().orbit;
        config.damping = Some(0.25);
        let mut controls = OrbitControls::new(config);
        let mut camera = camera_at([0.0, 0.0, 30.0]);
        controls.rotate_left(0.4);
        assert!(controls.update(&mut camera));
        assert!(controls.update(&mut camera));
        let theta = Spherical::from_offset(camera.position).theta;
        assert!(theta < 0.0 && theta > -0.4);
    }

    #[test]
    fn wheel_dollies_towards_and_away_from_target() {
        let mut camera = camera_at([0.0, 0.0, 30.0]);
        let mut controls = controls();
        controls.wheel(1.0);
        controls.update(&mut camera);
        assert!((camera.position.z - 28.5).abs() < 1e-3);
        controls.wheel(-1.0);
        controls.update(&mut camera);
        assert!((camera.position.z - 30.0).abs() < 1e-3);
    }

    #[test]
    fn dragging_rotates_only_while_button_is_held() {
        let mut camera = camera_at([0.0, 0.0, 30.0]);
        let mut controls = controls();
        controls.pointer_move(100.0, 100.0, &camera, 600);
        controls.pointer_move(160.0, 100.0, &camera, 600);
        assert!(!controls.update(&mut camera));

        controls.pointer_down(MouseButton::Left);
        controls.pointer_move(220.0, 100.0, &camera, 600);
        controls.pointer_up();
        assert!(controls.update(&mut camera));
        assert!(camera.position.x < 0.0);
    }

    #[test]
    fn panning_moves_target_and_camera_together() {
        let mut camera = camera_at([0.0, 0.0, 30.0]);
        let mut controls = controls();
        controls.pointer_move(300.0, 300.0, &camera, 600);
        controls.pointer_down(MouseButton::Right);
        controls.pointer_move(250.0, 300.0, &camera, 600);
        controls.update(&mut camera);
        assert!(controls.target.x > 0.0);
        assert!((camera.position.x - controls.target.x).abs() < 1e-3);
        assert!((camera.position.z - 30.0).abs() < 1e-3);
    }

    #[test]
    fn disabled_controls_ignore_input() {
        let mut camera = camera_at([0.0, 0.0, 30.0]);
        let mut controls = controls();
        controls.enabled = false;
        controls.pointer_down(MouseButton::Left);
        controls.wheel(3.0);
        assert!(!controls.is_dragging());
        assert!(!controls.update(&mut camera));
    }
}
