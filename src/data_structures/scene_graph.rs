//! Scene graph.
//!
//! A flat, insertion-ordered list of meshes and lights plus an optional
//! background texture. Nodes are appended and never removed, so the
//! [`NodeId`] handed out on insertion stays valid for the scene's lifetime.
//! Animated nodes are reached through those handles, never by position.

use cgmath::Vector3;

use crate::{
    config::Color,
    data_structures::{
        geometry::Geometry,
        instance::Transform,
        material::{Material, TextureRef},
    },
};

/// Stable handle of a node inside one [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Clone, Debug, PartialEq)]
pub struct MeshNode {
    pub name: String,
    pub geometry: Geometry,
    pub material: Material,
    pub transform: Transform,
}

impl MeshNode {
    pub fn new(name: impl Into<String>, geometry: Geometry, material: Material) -> Self {
        Self {
            name: name.into(),
            geometry,
            material,
            transform: Transform::new(),
        }
    }

    pub fn at(mut self, position: Vector3<f32>) -> Self {
        self.transform.position = position;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Light {
    Point { color: Color, position: Vector3<f32> },
    Ambient { color: Color },
}

#[derive(Clone, Debug, PartialEq)]
pub enum SceneNode {
    Mesh(MeshNode),
    Light(Light),
}

#[derive(Debug, Default)]
pub struct Scene {
    children: Vec<SceneNode>,
    pub background: Option<TextureRef>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: SceneNode) -> NodeId {
        self.children.push(node);
        NodeId(self.children.len() - 1)
    }

    pub fn add_mesh(&mut self, mesh: MeshNode) -> NodeId {
        self.add(SceneNode::Mesh(mesh))
    }

    pub fn add_light(&mut self, light: Light) -> NodeId {
        self.add(SceneNode::Light(light))
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn mesh(&self, id: NodeId) -> Option<&MeshNode> {
        match self.children.get(id.0) {
            Some(SceneNode::Mesh(mesh)) => Some(mesh),
            _ => None,
        }
    }

    pub fn mesh_mut(&mut self, id: NodeId) -> Option<&mut MeshNode> {
        match self.children.get_mut(id.0) {
            Some(SceneNode::Mesh(mesh)) => Some(mesh),
            _ => None,
        }
    }

    pub fn meshes(&self) -> impl Iterator<Item = &MeshNode> {
        self.children.iter().filter_map(|node| match node {
            SceneNode::Mesh(mesh) => Some(mesh),
            SceneNode::Light(_) => None,
        })
    }

    pub fn lights(&self) -> impl Iterator<Item = &Light> {
        self.children.iter().filter_map(|node| match node {
            SceneNode::Light(light) => Some(light),
            SceneNode::Mesh(_) => None,
        })
    }

    /// Every texture the scene references, background first, without repeats.
    pub fn textures(&self) -> Vec<TextureRef> {
        let mut textures: Vec<TextureRef> = Vec::new();
        let referenced = self
            .background
            .iter()
            .chain(self.meshes().flat_map(|mesh| mesh.material.textures()));
        for texture in referenced {
            if !textures.contains(texture) {
                textures.push(texture.clone());
            }
        }
        textures
    }
}
