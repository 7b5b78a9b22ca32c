//! Scene data: the CPU-side scene graph and the GPU resources it maps to.
//!
//! - `scene_graph` holds the ordered list of meshes and lights
//! - `geometry` tessellates torus, box and sphere shapes
//! - `material` describes surfaces and the textures they reference
//! - `instance` holds node transforms and their packed GPU form
//! - `model` contains uploaded meshes, GPU materials and the draw helper
//! - `texture` wraps GPU textures and their creation

pub mod geometry;
pub mod instance;
pub mod material;
pub mod model;
pub mod scene_graph;
pub mod texture;
