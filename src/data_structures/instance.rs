//! Node transforms and their GPU instance representation.
//!
//! A [`Transform`] stores rotation as Euler angles applied in X, Y, Z order,
//! so animation code can simply add to `rotation.x` every frame. Before
//! drawing, every transform is flattened into an [`InstanceRaw`] and packed
//! into the instance buffer of its batch.

use cgmath::{Matrix3, Matrix4, Rad, SquareMatrix, Vector3};

use crate::data_structures::model;

#[derive(Clone, Debug, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    /// Euler angles in radians.
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Transform {
    /// Identity transform: origin, no rotation, unit scale.
    pub fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn rotation_matrix(&self) -> Matrix3<f32> {
        Matrix3::from_angle_x(Rad(self.rotation.x))
            * Matrix3::from_angle_y(Rad(self.rotation.y))
            * Matrix3::from_angle_z(Rad(self.rotation.z))
    }

    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation_matrix())
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    pub fn to_raw(&self) -> InstanceRaw {
        let world_matrix = self.to_matrix();
        let handedness = world_matrix.determinant().signum();
        InstanceRaw {
            model: world_matrix.into(),
            normal: self.rotation_matrix().into(),
            handedness,
        }
    }
}

impl From<Vector3<f32>> for Transform {
    fn from(position: Vector3<f32>) -> Self {
        Transform {
            position,
            ..Default::default()
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

/**
 * The raw instance is the actual data stored on the GPU
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    pub(crate) model: [[f32; 4]; 4],
    pub(crate) normal: [[f32; 3]; 3],
    pub(crate) handedness: f32,
}

/**
 * Four vec4 slots for the model matrix, three vec3 slots for the normal
 * matrix and the handedness sign. Locations start after the vertex attributes.
 */
impl model::Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 19]>() as wgpu::BufferAddress,
                    shader_location: 10,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 22]>() as wgpu::BufferAddress,
                    shader_location: 11,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 25]>() as wgpu::BufferAddress,
                    shader_location: 12,
                    format: wgpu::VertexFormat::Float32,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector4};
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn identity_transform_is_identity_matrix() {
        assert_eq!(Transform::new().to_matrix(), Matrix4::identity());
    }

    #[test]
    fn translation_applies_after_rotation() {
        let mut transform = Transform::from(Vector3::new(-10.0, 0.0, 30.0));
        transform.rotation.y = FRAC_PI_2;
        let p = transform.to_matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);
        // +X rotated a quarter turn around Y points to -Z
        assert!((p.truncate() - Vector3::new(-10.0, 0.0, 29.0)).magnitude() < 1e-5);
    }

    #[test]
    fn raw_instance_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<InstanceRaw>(), 26 * 4);
        assert_eq!(Transform::new().to_raw().handedness, 1.0);
    }
}
