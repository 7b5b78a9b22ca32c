//! Surface descriptions for meshes.

use crate::config::Color;

/// Whether the material reacts to the scene lights.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Shading {
    /// Lit by the point and ambient lights.
    Standard,
    /// Flat colour/texture, ignores lights.
    Basic,
}

/// How the pixels of a texture are interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureRole {
    /// sRGB colour data.
    Color,
    /// Linear tangent-space normals.
    Normal,
}

/// A texture asset referenced by path, loaded asynchronously by the renderer.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TextureRef {
    pub path: String,
    pub role: TextureRole,
}

impl TextureRef {
    pub fn color(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            role: TextureRole::Color,
        }
    }

    pub fn normal(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            role: TextureRole::Normal,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub shading: Shading,
    pub color: Color,
    pub map: Option<TextureRef>,
    pub normal_map: Option<TextureRef>,
}

impl Material {
    pub fn standard(color: Color) -> Self {
        Self {
            shading: Shading::Standard,
            color,
            map: None,
            normal_map: None,
        }
    }

    pub fn basic(color: Color) -> Self {
        Self {
            shading: Shading::Basic,
            color,
            map: None,
            normal_map: None,
        }
    }

    pub fn with_map(mut self, map: TextureRef) -> Self {
        self.map = Some(map);
        self
    }

    pub fn with_normal_map(mut self, normal_map: TextureRef) -> Self {
        self.normal_map = Some(normal_map);
        self
    }

    pub fn textures(&self) -> impl Iterator<Item = &TextureRef> {
        self.map.iter().chain(self.normal_map.iter())
    }
}
