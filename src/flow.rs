//! Application event loop.
//!
//! Wires winit to a [`Stage`]: creates the window and GPU context, builds the
//! scene, starts texture downloads and drives one [`Stage::tick`] per redraw
//! while the [`FrameClock`] runs.
//!
//! # Lifecycle
//!
//! 1. `resumed` creates the window (the `bg` canvas in the browser) and the
//!    GPU context. Natively this blocks on the tokio runtime; in the browser
//!    it is spawned and reported back as [`FlowEvent::Initialized`].
//! 2. The stage is initialized for the window size, every referenced texture
//!    is fetched in the background and the frame clock starts.
//! 3. Decoded textures arrive as [`FlowEvent::TextureLoaded`], page scroll
//!    offsets as [`FlowEvent::Scrolled`] (browser) or mouse wheel input
//!    (native). Both are applied between frames.
//! 4. Each `RedrawRequested` ticks the stage and requests the next frame until
//!    the clock is stopped by a render failure or the window closes.

use std::sync::Arc;

use anyhow::Context as _;
use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

#[cfg(not(target_arch = "wasm32"))]
use crate::{controls::wheel_lines, scroll::PageScroll};
use crate::{
    config::SceneConfig,
    context::Context,
    frame_clock::FrameClock,
    render::SceneRenderer,
    resources::{LoadedTexture, Spawner},
    stage::Stage,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[derive(Debug)]
pub(crate) enum FlowEvent {
    /// The browser finished creating the GPU context.
    #[cfg(target_arch = "wasm32")]
    Initialized(Box<SceneRenderer>),
    TextureLoaded(LoadedTexture),
    /// New `top` of the document body, in pixels.
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    Scrolled(f64),
}

pub(crate) struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<FlowEvent>,
    config: SceneConfig,
    stage: Option<Stage<SceneRenderer>>,
    clock: FrameClock,
    #[cfg(not(target_arch = "wasm32"))]
    page: PageScroll,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(event_loop: &EventLoop<FlowEvent>, config: SceneConfig) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new().context("starting the tokio runtime")?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            #[cfg(not(target_arch = "wasm32"))]
            page: PageScroll::new(config.page_height),
            config,
            stage: None,
            clock: FrameClock::new(),
            error: None,
        })
    }

    fn spawner(&self) -> Spawner {
        #[cfg(not(target_arch = "wasm32"))]
        return Spawner::new(self.async_runtime.handle().clone());
        #[cfg(target_arch = "wasm32")]
        return Spawner::new();
    }

    /// Build the scene on a ready renderer and start animating.
    fn start(&mut self, renderer: SceneRenderer) {
        let window = renderer.ctx.window.clone();
        let mut stage = Stage::new(self.config.clone(), renderer);
        let textures = stage.initialize(&mut rand::thread_rng()).scene.textures();

        let size = window.inner_size();
        stage.resize(size.width, size.height);

        let spawner = self.spawner();
        for texture in textures {
            let proxy = self.proxy.clone();
            spawner.fetch_texture(texture, move |loaded| {
                if proxy.send_event(FlowEvent::TextureLoaded(loaded)).is_err() {
                    log::warn!("event loop closed before a texture arrived");
                }
            });
        }

        #[cfg(target_arch = "wasm32")]
        if let Err(e) = listen_to_scroll(self.proxy.clone()) {
            log::warn!("page scroll will not move the camera: {e:#}");
        }

        self.stage = Some(stage);
        self.clock.start();
        window.request_redraw();
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.clock.stop();
        self.error = Some(error);
        event_loop.exit();
    }

    fn create_window(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<Arc<Window>> {
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title(env!("CARGO_PKG_NAME"));

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowAttributesExtWebSys;

            let canvas = find_canvas(&self.config.canvas_id)?;
            window_attributes = window_attributes.with_canvas(Some(canvas));
        }

        let window = event_loop
            .create_window(window_attributes)
            .context("creating the window")?;
        Ok(Arc::new(window))
    }

    fn redraw(&mut self) {
        let Some(stage) = self.stage.as_mut() else {
            return;
        };
        let window = stage.renderer().ctx.window.clone();
        let size = window.inner_size();
        if stage.advance(&mut self.clock, Instant::now(), (size.width, size.height)) {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler<FlowEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.stage.is_some() {
            return;
        }
        let window = match self.create_window(event_loop) {
            Ok(window) => window,
            Err(e) => return self.fail(event_loop, e),
        };
        let camera = self.config.camera.clone();

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(Context::new(window, &camera)) {
                Ok(ctx) => self.start(SceneRenderer::new(ctx)),
                Err(e) => self.fail(event_loop, e),
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match Context::new(window, &camera).await {
                    Ok(ctx) => {
                        let renderer = Box::new(SceneRenderer::new(ctx));
                        if proxy
                            .send_event(FlowEvent::Initialized(renderer))
                            .is_err()
                        {
                            log::error!("event loop closed during start up");
                        }
                    }
                    Err(e) => log::error!("App initialization failed: {e:#}"),
                }
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: FlowEvent) {
        match event {
            #[cfg(target_arch = "wasm32")]
            FlowEvent::Initialized(renderer) => self.start(*renderer),
            FlowEvent::TextureLoaded(loaded) => match self.stage.as_mut() {
                Some(stage) => stage.renderer_mut().upload_texture(loaded),
                None => log::warn!("texture {} arrived without a stage", loaded.texture.path),
            },
            FlowEvent::Scrolled(top) => {
                if let Some(stage) = self.stage.as_mut() {
                    stage.on_scroll(top);
                }
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(stage) = self.stage.as_mut() else {
            return;
        };

        let consumed = stage.on_window_event(&event);
        #[cfg(target_arch = "wasm32")]
        let _ = consumed;

        match event {
            WindowEvent::CloseRequested => {
                self.clock.stop();
                stage.teardown();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => stage.resize(size.width, size.height),
            WindowEvent::RedrawRequested => self.redraw(),
            #[cfg(not(target_arch = "wasm32"))]
            WindowEvent::MouseWheel { delta, .. } if !consumed => {
                if let Some(top) = self.page.scroll_lines(wheel_lines(&delta) as f64) {
                    stage.on_scroll(top);
                }
            }
            _ => {}
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn find_canvas(id: &str) -> anyhow::Result<web_sys::HtmlCanvasElement> {
    use wasm_bindgen::JsCast;

    let document = web_sys::window()
        .and_then(|window| window.document())
        .context("no document to draw into")?;
    let canvas = document
        .get_element_by_id(id)
        .with_context(|| format!("no element with id `{id}`"))?;
    canvas
        .dyn_into::<web_sys::HtmlCanvasElement>()
        .map_err(|_| anyhow::anyhow!("element `{id}` is not a canvas"))
}

/// Report the body's top edge on every document scroll.
#[cfg(target_arch = "wasm32")]
fn listen_to_scroll(proxy: EventLoopProxy<FlowEvent>) -> anyhow::Result<()> {
    use wasm_bindgen::JsCast;

    let document = web_sys::window()
        .and_then(|window| window.document())
        .context("no document to listen on")?;
    let body = document.body().context("document has no body")?;
    let on_scroll = Closure::<dyn FnMut(web_sys::Event)>::new(move |_event: web_sys::Event| {
        let top = body.get_bounding_client_rect().top();
        if proxy.send_event(FlowEvent::Scrolled(top)).is_err() {
            log::warn!("scroll after the event loop closed");
        }
    });
    document
        .add_event_listener_with_callback("scroll", on_scroll.as_ref().unchecked_ref())
        .map_err(|_| anyhow::anyhow!("scroll listener rejected"))?;
    // lives as long as the page
    on_scroll.forget();
    Ok(())
}

/// Open the window and run the scene until it is closed.
pub fn run(config: SceneConfig) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<FlowEvent> = EventLoop::with_user_event().build()?;

    let mut app = App::new(&event_loop, config)?;

    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), wasm_bindgen::JsValue> {
    run(SceneConfig::default()).map_err(|e| wasm_bindgen::JsValue::from_str(&format!("{e:#}")))
}
