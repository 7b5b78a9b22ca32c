//! Scene configuration.
//!
//! [`SceneConfig`] gathers every constant the backdrop is built from: how many
//! stars are scattered and how far, how fast the torus and the moon spin, how
//! strongly scrolling moves the camera, and which assets are mapped onto the
//! meshes. `SceneConfig::default()` reproduces the portfolio page.

use std::path::PathBuf;

/// Environment variable overriding the native asset directory.
pub const ASSETS_ENV: &str = "PORTFOLIO_ASSETS";

/// RGB colour given as a packed `0xRRGGBB` hex value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color(pub u32);

impl Color {
    pub const WHITE: Color = Color(0xffffff);
    pub const TOMATO: Color = Color(0xff6347);

    /// Linear-ish float components in `[0, 1]`, alpha fixed to one.
    pub fn to_rgba(self) -> [f32; 4] {
        let r = ((self.0 >> 16) & 0xff) as f32 / 255.0;
        let g = ((self.0 >> 8) & 0xff) as f32 / 255.0;
        let b = (self.0 & 0xff) as f32 / 255.0;
        [r, g, b, 1.0]
    }

    pub fn to_rgb(self) -> [f32; 3] {
        let [r, g, b, _] = self.to_rgba();
        [r, g, b]
    }
}

/// Per-tick rotation increments in radians for one animated node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spin {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Multipliers mapping the document scroll offset onto the camera position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollFactors {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// File names of the textures, relative to the asset root.
#[derive(Clone, Debug, PartialEq)]
pub struct AssetNames {
    pub background: String,
    pub avatar: String,
    pub moon: String,
    pub moon_normal: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
    pub start_position: [f32; 3],
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrbitConfig {
    /// Radians of rotation for a drag across the full window height.
    pub rotate_speed: f32,
    pub pan_speed: f32,
    /// Dolly scale applied per wheel line.
    pub zoom_step: f32,
    /// `None` applies input in a single update, `Some(f)` eases it out.
    pub damping: Option<f32>,
    pub min_distance: f32,
    pub max_distance: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneConfig {
    pub star_count: usize,
    /// Stars are placed in `[-star_spread / 2, star_spread / 2)` on every axis.
    pub star_spread: f32,
    pub star_radius: f32,
    pub torus_spin: Spin,
    pub moon_spin: Spin,
    pub moon_position: [f32; 3],
    pub torus_color: Color,
    pub light_position: [f32; 3],
    pub light_color: Color,
    pub ambient_color: Color,
    pub scroll: ScrollFactors,
    /// Height in pixels that the native virtual page can be scrolled.
    pub page_height: f64,
    pub camera: CameraConfig,
    pub orbit: OrbitConfig,
    pub assets: AssetNames,
    /// DOM id of the canvas the browser build draws into.
    pub canvas_id: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            star_count: 200,
            star_spread: 100.0,
            star_radius: 0.25,
            torus_spin: Spin {
                x: 0.01,
                y: 0.005,
                z: 0.01,
            },
            moon_spin: Spin {
                x: 0.005,
                y: 0.0075,
                z: 0.0,
            },
            moon_position: [-10.0, 0.0, 30.0],
            torus_color: Color::TOMATO,
            light_position: [20.0, 20.0, 20.0],
            light_color: Color::WHITE,
            ambient_color: Color::WHITE,
            scroll: ScrollFactors {
                x: -0.0002,
                y: -0.0002,
                z: -0.01,
            },
            page_height: 4000.0,
            camera: CameraConfig {
                fovy: 75.0,
                znear: 0.1,
                zfar: 1000.0,
                start_position: [0.0, 0.0, 30.0],
            },
            orbit: OrbitConfig {
                rotate_speed: std::f32::consts::TAU,
                pan_speed: 1.0,
                zoom_step: 0.95,
                damping: None,
                min_distance: 0.0,
                max_distance: f32::INFINITY,
            },
            assets: AssetNames {
                background: "space.jpg".to_string(),
                avatar: "avatar.png".to_string(),
                moon: "moon.jpg".to_string(),
                moon_normal: "normal.jpg".to_string(),
            },
            canvas_id: "bg".to_string(),
        }
    }
}

/// Directory native builds read textures from.
///
/// Honours [`ASSETS_ENV`] and falls back to `./assets`.
pub fn asset_root() -> PathBuf {
    std::env::var_os(ASSETS_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./").join("assets"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colours_unpack_per_channel() {
        assert_eq!(Color::WHITE.to_rgba(), [1.0, 1.0, 1.0, 1.0]);
        let [r, g, b] = Color::TOMATO.to_rgb();
        assert_eq!(r, 1.0);
        assert!((g - 99.0 / 255.0).abs() < f32::EPSILON);
        assert!((b - 71.0 / 255.0).abs() < f32::EPSILON);
    }

    #[test]
    fn defaults_describe_the_portfolio_page() {
        let config = SceneConfig::default();
        assert_eq!(config.star_count, 200);
        assert_eq!(config.star_spread, 100.0);
        assert_eq!(config.camera.fovy, 75.0);
        assert_eq!(config.camera.start_position, [0.0, 0.0, 30.0]);
        assert_eq!(config.scroll.z, -0.01);
        assert_eq!(config.canvas_id, "bg");
    }
}
