//! Procedural geometry.
//!
//! Torus, box and sphere with the parameterisation web scenes commonly use,
//! so segment counts mean the same thing: rings and segments are emitted in
//! the same order and front faces wind counter-clockwise. Texture coordinates
//! are flipped to wgpu's top-left origin.

use std::f32::consts::{PI, TAU};

use cgmath::{InnerSpace, Vector2, Vector3};

use crate::data_structures::model::ModelVertex;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Geometry {
    Torus {
        radius: f32,
        tube: f32,
        radial_segments: u32,
        tubular_segments: u32,
    },
    Box {
        width: f32,
        height: f32,
        depth: f32,
    },
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
}

/// CPU side vertex and index data, ready to be uploaded.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

impl Geometry {
    pub fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> Self {
        Geometry::Torus {
            radius,
            tube,
            radial_segments: radial_segments.max(3),
            tubular_segments: tubular_segments.max(3),
        }
    }

    pub fn cube(width: f32, height: f32, depth: f32) -> Self {
        Geometry::Box {
            width,
            height,
            depth,
        }
    }

    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        Geometry::Sphere {
            radius,
            width_segments: width_segments.max(3),
            height_segments: height_segments.max(2),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Geometry::Torus { .. } => "torus",
            Geometry::Box { .. } => "box",
            Geometry::Sphere { .. } => "sphere",
        }
    }

    pub fn tessellate(&self) -> MeshData {
        let mut data = match *self {
            Geometry::Torus {
                radius,
                tube,
                radial_segments,
                tubular_segments,
            } => torus(radius, tube, radial_segments, tubular_segments),
            Geometry::Box {
                width,
                height,
                depth,
            } => cube(width, height, depth),
            Geometry::Sphere {
                radius,
                width_segments,
                height_segments,
            } => sphere(radius, width_segments, height_segments),
        };
        compute_tangents(&mut data);
        data
    }
}

fn vertex(position: Vector3<f32>, normal: Vector3<f32>, u: f32, v: f32) -> ModelVertex {
    ModelVertex {
        position: position.into(),
        tex_coords: [u, 1.0 - v],
        normal: normal.into(),
        tangent: [0.0; 3],
        bitangent: [0.0; 3],
    }
}

fn torus(radius: f32, tube: f32, radial: u32, tubular: u32) -> MeshData {
    let mut data = MeshData::default();
    for j in 0..=radial {
        for i in 0..=tubular {
            let u = i as f32 / tubular as f32 * TAU;
            let v = j as f32 / radial as f32 * TAU;
            let position = Vector3::new(
                (radius + tube * v.cos()) * u.cos(),
                (radius + tube * v.cos()) * u.sin(),
                tube * v.sin(),
            );
            let center = Vector3::new(radius * u.cos(), radius * u.sin(), 0.0);
            let normal = (position - center).normalize();
            data.vertices.push(vertex(
                position,
                normal,
                i as f32 / tubular as f32,
                j as f32 / radial as f32,
            ));
        }
    }
    let row = tubular + 1;
    for j in 1..=radial {
        for i in 1..=tubular {
            let a = row * j + i - 1;
            let b = row * (j - 1) + i - 1;
            let c = row * (j - 1) + i;
            let d = row * j + i;
            data.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
    data
}

fn sphere(radius: f32, width: u32, height: u32) -> MeshData {
    let mut data = MeshData::default();
    let mut grid: Vec<Vec<u32>> = Vec::with_capacity(height as usize + 1);
    let mut index = 0;
    for iy in 0..=height {
        let v = iy as f32 / height as f32;
        // pole vertices sit half a segment over so their uv fans stay symmetric
        let u_offset = if iy == 0 {
            0.5 / width as f32
        } else if iy == height {
            -0.5 / width as f32
        } else {
            0.0
        };
        let mut row = Vec::with_capacity(width as usize + 1);
        for ix in 0..=width {
            let u = ix as f32 / width as f32;
            let phi = u * TAU;
            let theta = v * PI;
            let position = Vector3::new(
                -radius * phi.cos() * theta.sin(),
                radius * theta.cos(),
                radius * phi.sin() * theta.sin(),
            );
            let normal = if position.magnitude2() > 0.0 {
                position.normalize()
            } else {
                Vector3::unit_y()
            };
            data.vertices.push(vertex(position, normal, u + u_offset, 1.0 - v));
            row.push(index);
            index += 1;
        }
        grid.push(row);
    }
    for iy in 0..height as usize {
        for ix in 0..width as usize {
            let a = grid[iy][ix + 1];
            let b = grid[iy][ix];
            let c = grid[iy + 1][ix];
            let d = grid[iy + 1][ix + 1];
            if iy != 0 {
                data.indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height as usize - 1 {
                data.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }
    data
}

fn cube(width: f32, height: f32, depth: f32) -> MeshData {
    let mut data = MeshData::default();
    // (u axis, v axis, w axis, u dir, v dir, plane width, plane height, plane depth)
    let planes = [
        (2, 1, 0, -1.0, -1.0, depth, height, width),
        (2, 1, 0, 1.0, -1.0, depth, height, -width),
        (0, 2, 1, 1.0, 1.0, width, depth, height),
        (0, 2, 1, 1.0, -1.0, width, depth, -height),
        (0, 1, 2, 1.0, -1.0, width, height, depth),
        (0, 1, 2, -1.0, -1.0, width, height, -depth),
    ];
    for (u, v, w, udir, vdir, plane_width, plane_height, plane_depth) in planes {
        let start = data.vertices.len() as u32;
        for iy in 0..=1u32 {
            let y = iy as f32 * plane_height - plane_height / 2.0;
            for ix in 0..=1u32 {
                let x = ix as f32 * plane_width - plane_width / 2.0;
                let mut position = [0.0; 3];
                position[u] = x * udir;
                position[v] = y * vdir;
                position[w] = plane_depth / 2.0;
                let mut normal = [0.0; 3];
                normal[w] = if plane_depth > 0.0 { 1.0 } else { -1.0 };
                data.vertices.push(vertex(
                    position.into(),
                    normal.into(),
                    ix as f32,
                    1.0 - iy as f32,
                ));
            }
        }
        let (a, b, c, d) = (start, start + 2, start + 3, start + 1);
        data.indices.extend_from_slice(&[a, b, d, b, c, d]);
    }
    data
}

/// Per-vertex tangent frames for normal mapping, averaged over the triangles
/// sharing each vertex.
fn compute_tangents(data: &mut MeshData) {
    let vertices = &mut data.vertices;
    let mut triangles_included = vec![0u32; vertices.len()];

    for c in data.indices.chunks(3) {
        let [i0, i1, i2] = [c[0] as usize, c[1] as usize, c[2] as usize];
        let pos0: Vector3<f32> = vertices[i0].position.into();
        let pos1: Vector3<f32> = vertices[i1].position.into();
        let pos2: Vector3<f32> = vertices[i2].position.into();
        let uv0: Vector2<f32> = vertices[i0].tex_coords.into();
        let uv1: Vector2<f32> = vertices[i1].tex_coords.into();
        let uv2: Vector2<f32> = vertices[i2].tex_coords.into();

        let delta_pos1 = pos1 - pos0;
        let delta_pos2 = pos2 - pos0;
        let delta_uv1 = uv1 - uv0;
        let delta_uv2 = uv2 - uv0;

        let det = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
        if det.abs() <= f32::EPSILON {
            continue;
        }
        let r = 1.0 / det;
        let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) * r;
        // flipped for right-handed normal maps in wgpu's texture space
        let bitangent = (delta_pos2 * delta_uv1.x - delta_pos1 * delta_uv2.x) * -r;

        for i in [i0, i1, i2] {
            vertices[i].tangent = (tangent + Vector3::from(vertices[i].tangent)).into();
            vertices[i].bitangent = (bitangent + Vector3::from(vertices[i].bitangent)).into();
            triangles_included[i] += 1;
        }
    }

    for (v, n) in vertices.iter_mut().zip(triangles_included) {
        if n == 0 {
            continue;
        }
        let denom = 1.0 / n as f32;
        v.tangent = (Vector3::from(v.tangent) * denom).into();
        v.bitangent = (Vector3::from(v.bitangent) * denom).into();
    }
}
