//! Scene construction.
//!
//! Builds the whole backdrop in one go: camera, lights, the torus, the star
//! field, the background, the avatar cube and the moon. The animated nodes are
//! returned as [`NodeId`] handles so the animation loop never has to search
//! the scene for them.

use cgmath::Vector3;
use rand::Rng;

use crate::{
    camera::{PerspectiveCamera, Projection},
    config::{Color, SceneConfig},
    data_structures::{
        geometry::Geometry,
        material::{Material, TextureRef},
        scene_graph::{Light, MeshNode, NodeId, Scene},
    },
};

/// A freshly built scene with handles to the nodes that move.
#[derive(Debug)]
pub struct BuiltScene {
    pub scene: Scene,
    pub camera: PerspectiveCamera,
    pub torus: NodeId,
    pub avatar: NodeId,
    pub moon: NodeId,
}

/// Build the scene for a `width` x `height` viewport. Star positions come
/// from `rng`.
pub fn build_scene<R: Rng>(
    config: &SceneConfig,
    rng: &mut R,
    width: u32,
    height: u32,
) -> BuiltScene {
    let camera = PerspectiveCamera::new(
        config.camera.start_position,
        Projection::new(
            width,
            height,
            config.camera.fovy,
            config.camera.znear,
            config.camera.zfar,
        ),
    );

    let mut scene = Scene::new();

    let torus = scene.add_mesh(MeshNode::new(
        "torus",
        Geometry::torus(10.0, 3.0, 16, 100),
        Material::standard(config.torus_color),
    ));

    scene.add_light(Light::Point {
        color: config.light_color,
        position: config.light_position.into(),
    });
    scene.add_light(Light::Ambient {
        color: config.ambient_color,
    });

    for position in scatter_stars(rng, config.star_count, config.star_spread) {
        scene.add_mesh(
            MeshNode::new(
                "star",
                Geometry::sphere(config.star_radius, 24, 24),
                Material::standard(Color::WHITE),
            )
            .at(position),
        );
    }

    scene.background = Some(TextureRef::color(config.assets.background.as_str()));

    let avatar = scene.add_mesh(MeshNode::new(
        "avatar",
        Geometry::cube(3.0, 3.0, 3.0),
        Material::basic(Color::WHITE).with_map(TextureRef::color(config.assets.avatar.as_str())),
    ));

    let moon = scene.add_mesh(
        MeshNode::new(
            "moon",
            Geometry::sphere(3.0, 32, 32),
            Material::standard(Color::WHITE)
                .with_map(TextureRef::color(config.assets.moon.as_str()))
                .with_normal_map(TextureRef::normal(config.assets.moon_normal.as_str())),
        )
        .at(config.moon_position.into()),
    );

    log::info!(
        "scene built: {} nodes, {} stars",
        scene.len(),
        config.star_count
    );

    BuiltScene {
        scene,
        camera,
        torus,
        avatar,
        moon,
    }
}

/// `count` positions, each coordinate uniform in `[-spread / 2, spread / 2)`.
pub fn scatter_stars<R: Rng>(rng: &mut R, count: usize, spread: f32) -> Vec<Vector3<f32>> {
    let half = spread / 2.0;
    let mut coord = || {
        if half > 0.0 {
            rng.gen_range(-half..half)
        } else {
            0.0
        }
    };
    (0..count)
        .map(|_| {
            let x = coord();
            let y = coord();
            let z = coord();
            Vector3::new(x, y, z)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::data_structures::material::Shading;

    fn built(seed: u64) -> BuiltScene {
        build_scene(&SceneConfig::default(), &mut StdRng::seed_from_u64(seed), 1600, 900)
    }

    #[test]
    fn two_hundred_stars_inside_the_cube() {
        let stars = scatter_stars(&mut StdRng::seed_from_u64(7), 200, 100.0);
        assert_eq!(stars.len(), 200);
        for star in stars {
            for c in [star.x, star.y, star.z] {
                assert!((-50.0..50.0).contains(&c), "{c} out of range");
            }
        }
    }

    #[test]
    fn same_seed_same_sky() {
        let a = scatter_stars(&mut StdRng::seed_from_u64(42), 10, 100.0);
        let b = scatter_stars(&mut StdRng::seed_from_u64(42), 10, 100.0);
        assert_eq!(a, b);
    }

    #[test]
    fn zero_spread_puts_stars_at_origin() {
        let stars = scatter_stars(&mut StdRng::seed_from_u64(1), 3, 0.0);
        assert!(stars.iter().all(|s| *s == Vector3::new(0.0, 0.0, 0.0)));
    }

    #[test]
    fn scene_has_every_node() {
        let built = built(1);
        assert_eq!(built.scene.meshes().count(), 203);
        assert_eq!(built.scene.lights().count(), 2);
        assert_eq!(built.scene.len(), 205);
        let stars = built.scene.meshes().filter(|m| m.name == "star").count();
        assert_eq!(stars, 200);
    }

    #[test]
    fn handles_point_at_the_animated_nodes() {
        let built = built(2);
        let torus = built.scene.mesh(built.torus).unwrap();
        assert_eq!(torus.geometry, Geometry::torus(10.0, 3.0, 16, 100));
        assert_eq!(torus.material.color, Color::TOMATO);

        let avatar = built.scene.mesh(built.avatar).unwrap();
        assert_eq!(avatar.material.shading, Shading::Basic);
        assert_eq!(avatar.material.map.as_ref().unwrap().path, "avatar.png");

        let moon = built.scene.mesh(built.moon).unwrap();
        assert_eq!(moon.transform.position, Vector3::new(-10.0, 0.0, 30.0));
        assert_eq!(moon.material.normal_map.as_ref().unwrap().path, "normal.jpg");
    }

    #[test]
    fn camera_starts_in_front_of_the_torus() {
        let built = built(3);
        assert_eq!(built.camera.position, Vector3::new(0.0, 0.0, 30.0));
        assert_eq!(built.camera.projection.fovy, 75.0);
        assert_eq!(built.camera.projection.aspect, 1600.0 / 900.0);
        assert_eq!(
            built.scene.background.as_ref().map(|t| t.path.as_str()),
            Some("space.jpg")
        );
    }
}
