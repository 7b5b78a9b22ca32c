use std::collections::HashMap;

use image::{GenericImageView, imageops::FilterType};

use crate::{
    data_structures::{
        material::{TextureRef, TextureRole},
        texture::Texture,
    },
    resources::LoadedTexture,
};

/// Layout of a material bind group: colour map + sampler, normal map +
/// sampler, material uniform.
pub fn material_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 3,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 4,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
        label: Some("material_bind_group_layout"),
    })
}

/// Layout of the background bind group: one texture and its sampler.
pub fn background_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("background_bind_group_layout"),
    })
}

/// Uploaded textures keyed by reference, plus the stand-ins used meanwhile.
///
/// `revision` increases with every upload so dependents can tell when to
/// rebuild their bind groups.
#[derive(Debug)]
pub struct TextureCache {
    loaded: HashMap<TextureRef, Texture>,
    default_color: Texture,
    default_normal: Texture,
    revision: u64,
}

impl TextureCache {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self {
            loaded: HashMap::new(),
            default_color: Texture::default_color(device, queue),
            default_normal: Texture::default_normal(device, queue),
            revision: 0,
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Upload `loaded`, scaling it down first if it exceeds the device's
    /// texture size limit.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, loaded: LoadedTexture) {
        let max = device.limits().max_texture_dimension_2d;
        let image = match fit_within(loaded.image.dimensions(), max) {
            Some((width, height)) => {
                log::warn!(
                    "texture {} is {}x{}, scaling to {}x{} for a {} texel limit",
                    loaded.texture.path,
                    loaded.image.width(),
                    loaded.image.height(),
                    width,
                    height,
                    max
                );
                loaded.image.resize(width, height, FilterType::Triangle)
            }
            None => loaded.image,
        };
        let texture = Texture::from_image(
            device,
            queue,
            &image,
            Some(&loaded.texture.path),
            loaded.texture.role,
        );
        self.loaded.insert(loaded.texture, texture);
        self.revision += 1;
    }

    pub fn is_loaded(&self, texture: &TextureRef) -> bool {
        self.loaded.contains_key(texture)
    }

    /// The uploaded texture or the neutral stand-in for its role.
    pub fn get_or_default(&self, texture: Option<&TextureRef>, role: TextureRole) -> &Texture {
        texture
            .and_then(|t| self.loaded.get(t))
            .unwrap_or(match role {
                TextureRole::Color => &self.default_color,
                TextureRole::Normal => &self.default_normal,
            })
    }
}

/// Dimensions to scale an image of `size` to so neither side exceeds `max`,
/// keeping the aspect ratio. `None` when it already fits.
pub fn fit_within((width, height): (u32, u32), max: u32) -> Option<(u32, u32)> {
    if width <= max && height <= max {
        return None;
    }
    let scale = max as f64 / width.max(height) as f64;
    let scaled = |side: u32| ((side as f64 * scale).round() as u32).clamp(1, max);
    Some((scaled(width), scaled(height)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn images_within_the_limit_are_left_alone() {
        assert_eq!(fit_within((2048, 2048), 2048), None);
        assert_eq!(fit_within((1, 1), 2048), None);
    }

    #[test]
    fn oversized_images_shrink_to_the_limit() {
        assert_eq!(fit_within((4096, 2048), 2048), Some((2048, 1024)));
        assert_eq!(fit_within((1000, 8192), 2048), Some((250, 2048)));
    }

    #[test]
    fn thin_images_keep_at_least_one_texel() {
        assert_eq!(fit_within((10000, 1), 2048), Some((2048, 1)));
    }
}
