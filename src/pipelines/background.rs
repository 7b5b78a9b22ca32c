//! Scene background: the background texture stretched over the whole viewport
//! behind every mesh, independent of the camera.

use crate::{
    data_structures::texture::Texture, pipelines::basic::mk_render_pipeline,
    resources::texture::background_layout,
};

pub fn mk_background_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    sample_count: u32,
    bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Background Pipeline Layout"),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Background Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("background.wgsl").into()),
    };
    // fullscreen triangle generated from the vertex index, no buffers
    mk_render_pipeline(
        device,
        &layout,
        config.format,
        Some(wgpu::BlendState::REPLACE),
        Some(Texture::DEPTH_FORMAT),
        false,
        None,
        &[],
        sample_count,
        shader,
    )
}

#[derive(Debug)]
pub struct BackgroundResources {
    pub pipeline: wgpu::RenderPipeline,
    pub bind_group_layout: wgpu::BindGroupLayout,
    /// Present once the background texture has been uploaded.
    pub bind_group: Option<wgpu::BindGroup>,
}

impl BackgroundResources {
    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        sample_count: u32,
    ) -> Self {
        let bind_group_layout = background_layout(device);
        let pipeline = mk_background_pipeline(device, config, sample_count, &bind_group_layout);
        Self {
            pipeline,
            bind_group_layout,
            bind_group: None,
        }
    }

    pub fn bind(&mut self, device: &wgpu::Device, texture: &Texture) {
        self.bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
            label: Some("background_bind_group"),
        }));
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        if let Some(bind_group) = &self.bind_group {
            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }
    }
}
