use std::sync::Arc;

use anyhow::Context as _;
use winit::window::Window;

use crate::{
    camera::{CameraResources, PerspectiveCamera, Projection},
    config::CameraConfig,
    data_structures::texture,
    pipelines::{
        background::BackgroundResources,
        basic::mk_mesh_pipeline,
        light::{LightResources, LightUniform},
    },
    resources::texture::{TextureCache, material_layout},
};

#[derive(Debug)]
pub struct Pipelines {
    pub mesh: wgpu::RenderPipeline,
    pub background: BackgroundResources,
}

/// Window, device and the long-lived GPU resources every frame draws with.
#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: texture::Texture,
    /// Multisampled colour target, resolved into the surface texture.
    pub(crate) msaa_view: Option<wgpu::TextureView>,
    pub(crate) sample_count: u32,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub light: LightResources,
    pub pipelines: Pipelines,
    pub material_layout: wgpu::BindGroupLayout,
    pub textures: TextureCache,
    pub clear_colour: wgpu::Color,
    pub(crate) is_surface_configured: bool,
}

impl Context {
    pub async fn new(window: Arc<Window>, camera: &CameraConfig) -> anyhow::Result<Self> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("creating the window surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no GPU adapter can present to this surface")?;

        log::info!("device and queue");
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("requesting a GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Shaders write linear colour and expect an sRGB surface.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface reports no texture formats")?;
        let present_mode = surface_caps
            .present_modes
            .first()
            .copied()
            .unwrap_or(wgpu::PresentMode::Fifo);
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let start = PerspectiveCamera::new(
            camera.start_position,
            Projection::new(
                config.width,
                config.height,
                camera.fovy,
                camera.znear,
                camera.zfar,
            ),
        );
        let camera = CameraResources::new(&device, &start);
        let light = LightResources::new(&device, LightUniform::from_lights(std::iter::empty()));

        let sample_count =
            texture::msaa_sample_count(adapter.get_texture_format_features(config.format).flags);
        log::info!("{sample_count}x multisampling");
        let msaa_view = texture::create_msaa_view(&device, &config, sample_count);
        let depth_texture = texture::Texture::create_depth_texture(
            &device,
            [config.width, config.height],
            sample_count,
            "depth_texture",
        );

        let material_layout = material_layout(&device);
        let pipelines = Pipelines {
            mesh: mk_mesh_pipeline(
                &device,
                &config,
                sample_count,
                &material_layout,
                &camera.bind_group_layout,
                &light.bind_group_layout,
            ),
            background: BackgroundResources::new(&device, &config, sample_count),
        };
        let textures = TextureCache::new(&device, &queue);

        Ok(Self {
            window,
            depth_texture,
            msaa_view,
            sample_count,
            surface,
            device,
            queue,
            config,
            camera,
            light,
            pipelines,
            material_layout,
            textures,
            clear_colour: wgpu::Color::BLACK,
            is_surface_configured: false,
        })
    }

    /// Reconfigure the surface and depth buffer. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture = texture::Texture::create_depth_texture(
            &self.device,
            [width, height],
            self.sample_count,
            "depth_texture",
        );
        self.msaa_view = texture::create_msaa_view(&self.device, &self.config, self.sample_count);
        self.is_surface_configured = true;
    }
}
