//! Render pipelines: `basic` draws the meshes, `background` the backdrop
//! texture and `light` holds the light uniform both lit materials read.

pub mod background;
pub mod basic;
pub mod light;
