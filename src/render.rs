//! Scene rendering and instance batching.
//!
//! [`RenderTarget`] is the narrow seam between the animation loop and the GPU:
//! draw a scene through a camera, and follow the output size. [`SceneRenderer`]
//! implements it on top of [`Context`].
//!
//! Meshes that share both geometry and material are drawn as one instanced
//! batch, so the star field costs a single draw call. Batches keep their GPU
//! mesh, material and instance buffer between frames; only the per-instance
//! transforms are rewritten every frame.

use std::iter;

use bytemuck::Zeroable;
use wgpu::util::DeviceExt;

use crate::{
    camera::PerspectiveCamera,
    context::Context,
    data_structures::{
        geometry::Geometry,
        instance::InstanceRaw,
        material::{Material, TextureRole},
        model::{DrawModel, GpuMaterial, MaterialUniform, Mesh},
        scene_graph::{MeshNode, Scene},
    },
    pipelines::light::LightUniform,
    resources::LoadedTexture,
};

/// Anything a scene can be drawn into.
pub trait RenderTarget {
    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera)
    -> Result<(), wgpu::SurfaceError>;

    /// Resize the output. Callers never pass zero dimensions.
    fn set_size(&mut self, width: u32, height: u32);

    fn size(&self) -> (u32, u32);
}

/// Meshes sharing one geometry and material, in scene order.
#[derive(Debug)]
pub struct Group<'a> {
    pub geometry: &'a Geometry,
    pub material: &'a Material,
    pub instances: Vec<InstanceRaw>,
}

/// Group meshes by (geometry, material). Groups appear in order of their first
/// member, instances in scene order.
pub fn group_meshes<'a>(meshes: impl Iterator<Item = &'a MeshNode>) -> Vec<Group<'a>> {
    let mut groups: Vec<Group<'a>> = Vec::new();
    for mesh in meshes {
        let raw = mesh.transform.to_raw();
        match groups
            .iter_mut()
            .find(|g| *g.geometry == mesh.geometry && *g.material == mesh.material)
        {
            Some(group) => group.instances.push(raw),
            None => groups.push(Group {
                geometry: &mesh.geometry,
                material: &mesh.material,
                instances: vec![raw],
            }),
        }
    }
    groups
}

#[derive(Debug)]
struct Batch {
    geometry: Geometry,
    material: Material,
    mesh: Mesh,
    gpu_material: GpuMaterial,
    instance_buffer: wgpu::Buffer,
    capacity: usize,
    amount: u32,
}

impl Batch {
    fn new(ctx: &Context, geometry: &Geometry, material: &Material) -> Self {
        let label = geometry.label();
        let mesh = Mesh::upload(&ctx.device, label, &geometry.tessellate());
        let gpu_material = GpuMaterial::new(
            &ctx.device,
            &ctx.material_layout,
            label,
            material_uniform(ctx, material),
            ctx.textures
                .get_or_default(material.map.as_ref(), TextureRole::Color),
            ctx.textures
                .get_or_default(material.normal_map.as_ref(), TextureRole::Normal),
        );
        Self {
            geometry: *geometry,
            material: material.clone(),
            mesh,
            gpu_material,
            instance_buffer: instance_buffer(&ctx.device, label, &[InstanceRaw::zeroed()]),
            capacity: 1,
            amount: 0,
        }
    }

    fn rebind(&mut self, ctx: &Context) {
        self.gpu_material.rebind(
            &ctx.device,
            &ctx.queue,
            &ctx.material_layout,
            self.geometry.label(),
            material_uniform(ctx, &self.material),
            ctx.textures
                .get_or_default(self.material.map.as_ref(), TextureRole::Color),
            ctx.textures
                .get_or_default(self.material.normal_map.as_ref(), TextureRole::Normal),
        );
    }

    fn write_instances(&mut self, ctx: &Context, instances: &[InstanceRaw]) {
        if instances.len() > self.capacity {
            self.capacity = instances.len().next_power_of_two();
            let mut padded = instances.to_vec();
            padded.resize(self.capacity, InstanceRaw::zeroed());
            self.instance_buffer = instance_buffer(&ctx.device, self.geometry.label(), &padded);
        } else {
            ctx.queue
                .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(instances));
        }
        self.amount = instances.len() as u32;
    }
}

fn material_uniform(ctx: &Context, material: &Material) -> MaterialUniform {
    let has_normal_map = material
        .normal_map
        .as_ref()
        .is_some_and(|normal| ctx.textures.is_loaded(normal));
    MaterialUniform::new(material, has_normal_map)
}

fn instance_buffer(device: &wgpu::Device, label: &str, instances: &[InstanceRaw]) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{label} Instance Buffer")),
        contents: bytemuck::cast_slice(instances),
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
    })
}

/// Draws a [`Scene`] to the window surface owned by its [`Context`].
#[derive(Debug)]
pub struct SceneRenderer {
    pub ctx: Context,
    batches: Vec<Batch>,
    bound_revision: u64,
}

impl SceneRenderer {
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            batches: Vec::new(),
            bound_revision: 0,
        }
    }

    /// Upload a decoded texture. Materials pick it up on the next frame.
    pub fn upload_texture(&mut self, loaded: LoadedTexture) {
        self.ctx
            .textures
            .upload(&self.ctx.device, &self.ctx.queue, loaded);
    }

    /// Make every batch match the scene and refresh bindings after uploads.
    fn prepare(&mut self, scene: &Scene, camera: &PerspectiveCamera) {
        let Self {
            ctx,
            batches,
            bound_revision,
        } = self;

        let revision = ctx.textures.revision();
        if revision != *bound_revision {
            for batch in batches.iter_mut() {
                batch.rebind(ctx);
            }
            if let Some(background) = scene.background.as_ref() {
                if ctx.textures.is_loaded(background) {
                    let texture = ctx
                        .textures
                        .get_or_default(Some(background), TextureRole::Color);
                    ctx.pipelines.background.bind(&ctx.device, texture);
                }
            }
            *bound_revision = revision;
        }

        for batch in batches.iter_mut() {
            batch.amount = 0;
        }
        for group in group_meshes(scene.meshes()) {
            let index = match batches
                .iter()
                .position(|b| b.geometry == *group.geometry && b.material == *group.material)
            {
                Some(index) => index,
                None => {
                    log::debug!("new batch for {}", group.geometry.label());
                    batches.push(Batch::new(ctx, group.geometry, group.material));
                    batches.len() - 1
                }
            };
            batches[index].write_instances(ctx, &group.instances);
        }

        ctx.camera.write(&ctx.queue, camera);
        ctx.light
            .write(&ctx.queue, LightUniform::from_lights(scene.lights()));
    }
}

impl RenderTarget for SceneRenderer {
    fn render(
        &mut self,
        scene: &Scene,
        camera: &PerspectiveCamera,
    ) -> Result<(), wgpu::SurfaceError> {
        // Rendering requires the surface to be configured
        if !self.ctx.is_surface_configured {
            return Ok(());
        }
        self.prepare(scene, camera);

        let ctx = &self.ctx;
        let output = ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: ctx.msaa_view.as_ref().unwrap_or(&view),
                    resolve_target: ctx.msaa_view.as_ref().map(|_| &view),
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            ctx.pipelines.background.draw(&mut render_pass);

            render_pass.set_pipeline(&ctx.pipelines.mesh);
            for batch in self.batches.iter().filter(|b| b.amount > 0) {
                render_pass.set_vertex_buffer(1, batch.instance_buffer.slice(..));
                render_pass.draw_mesh_instanced(
                    &batch.mesh,
                    &batch.gpu_material,
                    0..batch.amount,
                    &ctx.camera.bind_group,
                    &ctx.light.bind_group,
                );
            }
        }

        ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.ctx.resize(width, height);
    }

    fn size(&self) -> (u32, u32) {
        (self.ctx.config.width, self.ctx.config.height)
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Vector3;

    use super::*;
    use crate::{config::Color, data_structures::material::TextureRef};

    fn star(x: f32) -> MeshNode {
        MeshNode::new("star", Geometry::sphere(0.25, 24, 24), Material::standard(Color::WHITE))
            .at(Vector3::new(x, 0.0, 0.0))
    }

    #[test]
    fn identical_meshes_share_one_group() {
        let stars: Vec<_> = (0..200).map(|i| star(i as f32)).collect();
        let groups = group_meshes(stars.iter());
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].instances.len(), 200);
        // scene order is kept inside the group
        assert_eq!(groups[0].instances[7].model[3][0], 7.0);
    }

    #[test]
    fn material_or_geometry_difference_splits_groups() {
        let moon = MeshNode::new(
            "moon",
            Geometry::sphere(3.0, 32, 32),
            Material::standard(Color::WHITE).with_map(TextureRef::color("moon.jpg")),
        );
        let plain_moon = MeshNode::new(
            "plain",
            Geometry::sphere(3.0, 32, 32),
            Material::standard(Color::WHITE),
        );
        let meshes = [star(0.0), moon, star(1.0), plain_moon];
        let groups = group_meshes(meshes.iter());
        let sizes: Vec<_> = groups.iter().map(|g| g.instances.len()).collect();
        assert_eq!(sizes, [2, 1, 1]);
    }
}
