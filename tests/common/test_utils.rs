use portfolio_scene::{
    RenderTarget, SceneConfig, Stage,
    camera::PerspectiveCamera,
    data_structures::scene_graph::Scene,
};
use rand::{SeedableRng, rngs::StdRng};

/// What the renderer saw in one frame.
#[derive(Clone, Debug)]
pub struct Frame {
    pub camera: PerspectiveCamera,
    pub torus_rotation_x: f32,
    pub meshes: usize,
}

/// Render target that records frames instead of drawing them.
#[derive(Debug)]
pub struct RecordingRenderer {
    pub size: (u32, u32),
    pub frames: Vec<Frame>,
}

impl RecordingRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            frames: Vec::new(),
        }
    }
}

impl RenderTarget for RecordingRenderer {
    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<(), wgpu::SurfaceError> {
        let torus_rotation_x = scene
            .meshes()
            .find(|m| m.name == "torus")
            .map(|m| m.transform.rotation.x)
            .unwrap_or_default();
        self.frames.push(Frame {
            camera: camera.clone(),
            torus_rotation_x,
            meshes: scene.meshes().count(),
        });
        Ok(())
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }
}

pub fn seeded_stage(seed: u64) -> Stage<RecordingRenderer> {
    let mut stage = Stage::new(SceneConfig::default(), RecordingRenderer::new(1280, 720));
    stage.initialize(&mut StdRng::seed_from_u64(seed));
    stage
}

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}
