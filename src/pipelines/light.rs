use cgmath::Vector3;
use wgpu::util::DeviceExt;

use crate::{config::Color, data_structures::scene_graph::Light};

#[derive(Debug)]
pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

/// One point light plus the summed ambient term.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    position: [f32; 3],
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use a padding field here
    _padding: u32,
    color: [f32; 3],
    _padding2: u32,
    ambient: [f32; 3],
    _padding3: u32,
}

impl LightUniform {
    pub fn new(position: Vector3<f32>, color: Color, ambient: [f32; 3]) -> Self {
        Self {
            position: position.into(),
            _padding: 0,
            color: color.to_rgb(),
            _padding2: 0,
            ambient,
            _padding3: 0,
        }
    }

    /// Collect the scene lights. The first point light wins; ambient lights add up.
    /// Without a point light only the ambient term lights the scene.
    pub fn from_lights<'a>(lights: impl Iterator<Item = &'a Light>) -> Self {
        let mut point: Option<(Vector3<f32>, Color)> = None;
        let mut ambient = [0.0f32; 3];
        for light in lights {
            match light {
                Light::Point { color, position } => {
                    if point.is_none() {
                        point = Some((*position, *color));
                    }
                }
                Light::Ambient { color } => {
                    for (sum, c) in ambient.iter_mut().zip(color.to_rgb()) {
                        *sum += c;
                    }
                }
            }
        }
        let (position, color) = point.unwrap_or((Vector3::new(0.0, 0.0, 0.0), Color(0)));
        Self::new(position, color, ambient)
    }
}

impl LightResources {
    pub fn new(device: &wgpu::Device, uniform: LightUniform) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Buffer"),
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
            label: Some("light_bind_group_layout"),
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("light_bind_group"),
        });
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn write(&mut self, queue: &wgpu::Queue, uniform: LightUniform) {
        if uniform != self.uniform {
            self.uniform = uniform;
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[uniform]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_point_light_and_summed_ambient() {
        let lights = [
            Light::Point {
                color: Color::WHITE,
                position: Vector3::new(20.0, 20.0, 20.0),
            },
            Light::Ambient {
                color: Color(0x404040),
            },
            Light::Point {
                color: Color(0xff0000),
                position: Vector3::new(-1.0, 0.0, 0.0),
            },
            Light::Ambient {
                color: Color(0x404040),
            },
        ];
        let uniform = LightUniform::from_lights(lights.iter());
        assert_eq!(uniform.position, [20.0, 20.0, 20.0]);
        assert_eq!(uniform.color, [1.0, 1.0, 1.0]);
        let expected = 2.0 * 64.0 / 255.0;
        assert!(uniform.ambient.iter().all(|c| (c - expected).abs() < 1e-6));
    }

    #[test]
    fn uniform_layout_matches_shader() {
        assert_eq!(std::mem::size_of::<LightUniform>(), 48);
    }
}
