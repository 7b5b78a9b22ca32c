//! The running scene.
//!
//! A [`Stage`] owns the renderer, the scene, its camera and the camera inputs.
//! It is the only place scene state is mutated: scroll offsets, orbit input,
//! resizes and the per-frame animation all go through it, on the event-loop
//! thread.

use instant::Instant;
use rand::Rng;
use winit::event::WindowEvent;

use crate::{
    builder::{BuiltScene, build_scene},
    config::{SceneConfig, Spin},
    controls::OrbitControls,
    data_structures::scene_graph::NodeId,
    frame_clock::FrameClock,
    render::RenderTarget,
    scroll::ScrollCameraDriver,
};

#[derive(Debug)]
pub struct Stage<R: RenderTarget> {
    config: SceneConfig,
    renderer: R,
    controls: OrbitControls,
    scroll: ScrollCameraDriver,
    world: Option<BuiltScene>,
}

impl<R: RenderTarget> Stage<R> {
    pub fn new(config: SceneConfig, renderer: R) -> Self {
        Self {
            controls: OrbitControls::new(config.orbit.clone()),
            scroll: ScrollCameraDriver::new(config.scroll),
            config,
            renderer,
            world: None,
        }
    }

    /// Build the scene and camera for the renderer's current size. Runs once;
    /// later calls keep the existing scene.
    pub fn initialize<G: Rng>(&mut self, rng: &mut G) -> &BuiltScene {
        if self.world.is_some() {
            log::warn!("stage already initialized, keeping the current scene");
        }
        let (width, height) = self.renderer.size();
        let config = &self.config;
        self.world
            .get_or_insert_with(|| build_scene(config, rng, width, height))
    }

    /// Drop the scene. Ticks and input are ignored until the next `initialize`.
    pub fn teardown(&mut self) {
        if self.world.take().is_some() {
            log::info!("stage torn down");
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.world.is_some()
    }

    pub fn world(&self) -> Option<&BuiltScene> {
        self.world.as_ref()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// One animation frame: spin the torus and the moon, apply orbit input,
    /// then draw. The frame shows this tick's rotation.
    pub fn tick(&mut self) -> Result<(), wgpu::SurfaceError> {
        let Some(world) = self.world.as_mut() else {
            return Ok(());
        };
        let (torus, moon) = (world.torus, world.moon);
        spin(world, torus, self.config.torus_spin);
        spin(world, moon, self.config.moon_spin);
        self.controls.update(&mut world.camera);
        self.renderer.render(&world.scene, &world.camera)
    }

    /// Produce the frame for a redraw at `now` if `clock` is running.
    ///
    /// A lost or outdated surface is resized to `size` and the frame is
    /// retried on the next redraw. Any other render error stops the clock.
    /// Returns true when another redraw should be requested.
    pub fn advance(&mut self, clock: &mut FrameClock, now: Instant, size: (u32, u32)) -> bool {
        let Some(dt) = clock.begin_frame(now) else {
            return false;
        };
        log::trace!("frame {} after {:?}", clock.frames(), dt);
        match self.tick() {
            Ok(()) => true,
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost, reconfiguring at {}x{}", size.0, size.1);
                self.resize(size.0, size.1);
                true
            }
            Err(e) => {
                log::error!("Unable to render {}", e);
                clock.stop();
                false
            }
        }
    }

    /// Move the camera for the page offset `top`.
    pub fn on_scroll(&mut self, top: f64) {
        if let Some(world) = self.world.as_mut() {
            self.scroll.on_scroll(&mut world.camera, top);
        }
    }

    /// Forward pointer input to the orbit controls. Returns true if consumed.
    pub fn on_window_event(&mut self, event: &WindowEvent) -> bool {
        let Some(world) = self.world.as_ref() else {
            return false;
        };
        let (_, height) = self.renderer.size();
        self.controls
            .handle_window_event(event, &world.camera, height)
    }

    /// Follow the viewport: camera aspect `width / height`, renderer output
    /// `width` x `height`. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if let Some(world) = self.world.as_mut() {
            world.camera.projection.resize(width, height);
        }
        self.renderer.set_size(width, height);
    }
}

fn spin(world: &mut BuiltScene, node: NodeId, spin: Spin) {
    if let Some(mesh) = world.scene.mesh_mut(node) {
        mesh.transform.rotation.x += spin.x;
        mesh.transform.rotation.y += spin.y;
        mesh.transform.rotation.z += spin.z;
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Vector3;
    use instant::Duration;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{camera::PerspectiveCamera, data_structures::scene_graph::Scene};

    #[derive(Debug, Default)]
    struct MockRenderer {
        size: (u32, u32),
        frames: Vec<(Vector3<f32>, Vector3<f32>)>,
        fail_with: Option<wgpu::SurfaceError>,
        torus: Option<NodeId>,
        moon: Option<NodeId>,
    }

    impl RenderTarget for MockRenderer {
        fn render(
            &mut self,
            scene: &Scene,
            _camera: &PerspectiveCamera,
        ) -> Result<(), wgpu::SurfaceError> {
            if let Some(err) = self.fail_with.clone() {
                return Err(err);
            }
            let rotation = |id: Option<NodeId>| {
                id.and_then(|id| scene.mesh(id))
                    .map(|m| m.transform.rotation)
                    .unwrap_or(Vector3::new(0.0, 0.0, 0.0))
            };
            self.frames.push((rotation(self.torus), rotation(self.moon)));
            Ok(())
        }

        fn set_size(&mut self, width: u32, height: u32) {
            self.size = (width, height);
        }

        fn size(&self) -> (u32, u32) {
            self.size
        }
    }

    fn stage() -> Stage<MockRenderer> {
        let renderer = MockRenderer {
            size: (800, 600),
            ..Default::default()
        };
        let mut stage = Stage::new(SceneConfig::default(), renderer);
        let (torus, moon) = {
            let world = stage.initialize(&mut StdRng::seed_from_u64(0));
            (world.torus, world.moon)
        };
        stage.renderer_mut().torus = Some(torus);
        stage.renderer_mut().moon = Some(moon);
        stage
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn rotation_accumulates_per_tick() {
        let mut stage = stage();
        for _ in 0..100 {
            stage.tick().unwrap();
        }
        let world = stage.world().unwrap();
        let torus = &world.scene.mesh(world.torus).unwrap().transform.rotation;
        assert!(close(torus.x, 1.0));
        assert!(close(torus.y, 0.5));
        assert!(close(torus.z, 1.0));
        let moon = &world.scene.mesh(world.moon).unwrap().transform.rotation;
        assert!(close(moon.x, 0.5));
        assert!(close(moon.y, 0.75));
        assert_eq!(moon.z, 0.0);
    }

    #[test]
    fn render_sees_the_same_ticks_rotation() {
        let mut stage = stage();
        stage.tick().unwrap();
        stage.tick().unwrap();
        let frames = &stage.renderer().frames;
        assert_eq!(frames.len(), 2);
        assert!(close(frames[0].0.x, 0.01));
        assert!(close(frames[1].0.x, 0.02));
        assert!(close(frames[1].1.y, 0.015));
    }

    #[test]
    fn render_errors_surface_to_the_caller() {
        let mut stage = stage();
        stage.renderer_mut().fail_with = Some(wgpu::SurfaceError::Timeout);
        assert!(stage.tick().is_err());
    }

    fn running_clock() -> FrameClock {
        let mut clock = FrameClock::new();
        clock.start();
        clock
    }

    #[test]
    fn advance_renders_while_the_clock_runs() {
        let mut stage = stage();
        let mut clock = running_clock();
        let t0 = Instant::now();
        assert!(stage.advance(&mut clock, t0, (800, 600)));
        assert!(stage.advance(&mut clock, t0 + Duration::from_millis(16), (800, 600)));
        assert_eq!(stage.renderer().frames.len(), 2);
        assert_eq!(clock.frames(), 2);
    }

    #[test]
    fn stopped_clock_renders_nothing() {
        let mut stage = stage();
        let mut clock = FrameClock::new();
        assert!(!stage.advance(&mut clock, Instant::now(), (800, 600)));
        assert!(stage.renderer().frames.is_empty());
        let world = stage.world().unwrap();
        let torus = world.scene.mesh(world.torus).unwrap();
        assert_eq!(torus.transform.rotation.x, 0.0);
    }

    #[test]
    fn fatal_render_error_stops_the_clock() {
        let mut stage = stage();
        let mut clock = running_clock();
        stage.renderer_mut().fail_with = Some(wgpu::SurfaceError::Timeout);
        assert!(!stage.advance(&mut clock, Instant::now(), (800, 600)));
        assert!(!clock.is_running());

        // nothing more is drawn once stopped, even after the error clears
        stage.renderer_mut().fail_with = None;
        assert!(!stage.advance(&mut clock, Instant::now(), (800, 600)));
        assert!(stage.renderer().frames.is_empty());
    }

    #[test]
    fn lost_surface_is_resized_and_retried() {
        for error in [wgpu::SurfaceError::Lost, wgpu::SurfaceError::Outdated] {
            let mut stage = stage();
            let mut clock = running_clock();
            stage.renderer_mut().fail_with = Some(error);
            assert!(stage.advance(&mut clock, Instant::now(), (1024, 768)));
            assert!(clock.is_running());
            assert_eq!(stage.renderer().size, (1024, 768));

            stage.renderer_mut().fail_with = None;
            assert!(stage.advance(&mut clock, Instant::now(), (1024, 768)));
            assert_eq!(stage.renderer().frames.len(), 1);
        }
    }

    #[test]
    fn resize_updates_aspect_and_output() {
        let mut stage = stage();
        stage.resize(1920, 1080);
        assert_eq!(stage.renderer().size, (1920, 1080));
        let aspect = stage.world().unwrap().camera.projection.aspect;
        assert_eq!(aspect, 1920.0 / 1080.0);

        stage.resize(0, 1080);
        assert_eq!(stage.renderer().size, (1920, 1080));
    }

    #[test]
    fn scroll_moves_the_camera_and_orbit_keeps_it() {
        let mut stage = stage();
        stage.on_scroll(-1000.0);
        stage.tick().unwrap();
        let camera = &stage.world().unwrap().camera;
        assert!(close(camera.position.z, 10.0));
        assert!(close(camera.position.x, 0.2));
        assert!(close(camera.position.y, 0.2));
    }

    #[test]
    fn initialize_runs_once() {
        let mut stage = stage();
        stage.tick().unwrap();
        let torus = stage.initialize(&mut StdRng::seed_from_u64(99)).torus;
        let world = stage.world().unwrap();
        assert!(close(world.scene.mesh(torus).unwrap().transform.rotation.x, 0.01));
    }

    #[test]
    fn torn_down_stage_ignores_ticks() {
        let mut stage = stage();
        stage.teardown();
        assert!(!stage.is_initialized());
        stage.tick().unwrap();
        stage.on_scroll(-500.0);
        assert!(stage.renderer().frames.is_empty());
    }
}
