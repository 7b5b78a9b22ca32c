//! Perspective camera, projection and the GPU-side camera uniform.
//!
//! The camera is a position plus a look-at target. Orientation is implicit:
//! it always faces the target with +Y up. [`crate::scroll`] writes the position
//! directly and [`crate::controls::OrbitControls`] moves it around the target.

use cgmath::{InnerSpace, Matrix4, Point3, Vector3, perspective};
use wgpu::util::DeviceExt;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Projection parameters. `fovy` is vertical and in degrees.
#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    pub aspect: f32,
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn new(width: u32, height: u32, fovy: f32, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: aspect_of(width, height),
            fovy,
            znear,
            zfar,
        }
    }

    /// Recompute the aspect ratio for a new viewport. Zero heights are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = aspect_of(width, height);
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX
            * perspective(cgmath::Deg(self.fovy), self.aspect, self.znear, self.zfar)
    }
}

fn aspect_of(width: u32, height: u32) -> f32 {
    width as f32 / height.max(1) as f32
}

#[derive(Clone, Debug, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vector3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub projection: Projection,
}

impl PerspectiveCamera {
    pub fn new<V: Into<Vector3<f32>>>(position: V, projection: Projection) -> Self {
        Self {
            position: position.into(),
            target: Point3::new(0.0, 0.0, 0.0),
            up: Vector3::unit_y(),
            projection,
        }
    }

    pub fn eye(&self) -> Point3<f32> {
        Point3::new(self.position.x, self.position.y, self.position.z)
    }

    pub fn calc_view(&self) -> Matrix4<f32> {
        let eye = self.eye();
        // look_at_rh degenerates when eye and target coincide
        if (eye - self.target).magnitude2() <= f32::EPSILON {
            return Matrix4::look_to_rh(eye, -Vector3::unit_z(), self.up);
        }
        Matrix4::look_at_rh(eye, self.target, self.up)
    }

    pub fn view_proj(&self) -> Matrix4<f32> {
        self.projection.calc_matrix() * self.calc_view()
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &PerspectiveCamera) {
        self.view_position = camera.eye().to_homogeneous().into();
        self.view_proj = camera.view_proj().into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// GPU handles for the camera uniform.
#[derive(Debug)]
pub struct CameraResources {
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(device: &wgpu::Device, camera: &PerspectiveCamera) -> Self {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(camera);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("camera_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Upload the camera's current view-projection.
    pub fn write(&mut self, queue: &wgpu::Queue, camera: &PerspectiveCamera) {
        self.uniform.update_view_proj(camera);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{SquareMatrix, Vector4};

    #[test]
    fn aspect_follows_viewport() {
        let mut projection = Projection::new(1600, 900, 75.0, 0.1, 1000.0);
        assert_eq!(projection.aspect, 1600.0 / 900.0);
        projection.resize(800, 800);
        assert_eq!(projection.aspect, 1.0);
        projection.resize(800, 0);
        assert_eq!(projection.aspect, 1.0);
    }

    #[test]
    fn origin_is_in_front_of_default_camera() {
        let camera = PerspectiveCamera::new((0.0, 0.0, 30.0), Projection::new(1, 1, 75.0, 0.1, 1000.0));
        let clip = camera.view_proj() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        let ndc_z = clip.z / clip.w;
        assert!(clip.w > 0.0);
        assert!((0.0..=1.0).contains(&ndc_z));
        assert!((clip.x / clip.w).abs() < 1e-6);
    }

    #[test]
    fn camera_on_target_still_has_invertible_view() {
        let camera = PerspectiveCamera::new((0.0, 0.0, 0.0), Projection::new(1, 1, 75.0, 0.1, 1000.0));
        assert!(camera.calc_view().invert().is_some());
    }
}
