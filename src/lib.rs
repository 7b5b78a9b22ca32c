//! portfolio-scene
//!
//! The animated 3D backdrop of a personal portfolio page: a rotating torus, a
//! field of 200 stars, a textured avatar cube and a normal-mapped moon in front
//! of a space background. The camera follows the page scroll and can be
//! orbited with the mouse. Runs natively through winit and in the browser
//! through WASM, rendering with wgpu.
//!
//! High-level modules
//! - `builder`: constructs the scene, camera and lights
//! - `camera`: perspective camera, projection and its uniform
//! - `config`: every tunable of the scene with defaults matching the page
//! - `context`: window, device, queue and long-lived GPU resources
//! - `controls`: orbit controls (drag to rotate, pan, zoom)
//! - `data_structures`: scene graph, geometries, materials, meshes, textures
//! - `flow`: winit application and event wiring
//! - `frame_clock`: start/stop frame scheduling
//! - `pipelines`: mesh and background render pipelines, light uniform
//! - `render`: the render target seam and the batching scene renderer
//! - `resources`: asynchronous texture loading
//! - `scroll`: scroll offset to camera position
//! - `stage`: the running scene and its per-frame animation
//!

pub mod builder;
pub mod camera;
pub mod config;
pub mod context;
pub mod controls;
pub mod data_structures;
pub mod flow;
pub mod frame_clock;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scroll;
pub mod stage;

// Re-exports commonly used types for convenience in downstream code.
pub use builder::{BuiltScene, build_scene};
pub use config::SceneConfig;
pub use flow::run;
pub use render::RenderTarget;
pub use stage::Stage;
