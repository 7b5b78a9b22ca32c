mod common;

use cgmath::Vector3;
use portfolio_scene::{SceneConfig, build_scene, render::group_meshes};
use rand::{SeedableRng, rngs::StdRng};

use crate::common::test_utils::{approx, seeded_stage};

#[test]
fn stars_fill_the_cube_and_batch_into_one_draw() {
    let built = build_scene(
        &SceneConfig::default(),
        &mut StdRng::seed_from_u64(2024),
        1280,
        720,
    );
    let stars: Vec<_> = built.scene.meshes().filter(|m| m.name == "star").collect();
    assert_eq!(stars.len(), 200);
    for star in &stars {
        let p = star.transform.position;
        for c in [p.x, p.y, p.z] {
            assert!((-50.0..50.0).contains(&c));
        }
    }

    let groups = group_meshes(built.scene.meshes());
    let sizes: Vec<_> = groups.iter().map(|g| g.instances.len()).collect();
    assert_eq!(sizes, [1, 200, 1, 1]);
}

#[test]
fn every_frame_renders_after_rotating() {
    let mut stage = seeded_stage(1);
    for _ in 0..30 {
        stage.tick().unwrap();
    }
    let frames = &stage.renderer().frames;
    assert_eq!(frames.len(), 30);
    for (i, frame) in frames.iter().enumerate() {
        assert!(approx(frame.torus_rotation_x, (i + 1) as f32 * 0.01));
        assert_eq!(frame.meshes, 203);
    }
}

#[test]
fn scroll_drives_the_rendered_camera() {
    let mut stage = seeded_stage(2);
    stage.tick().unwrap();
    assert!(approx(stage.renderer().frames[0].camera.position.z, 30.0));

    stage.on_scroll(-2500.0);
    stage.tick().unwrap();
    let camera = &stage.renderer().frames[1].camera;
    assert!(approx(camera.position.z, 25.0));
    assert!(approx(camera.position.x, 0.5));
    assert!(approx(camera.position.y, 0.5));

    // back at the top of the page the camera sits on the orbit target
    stage.on_scroll(0.0);
    stage.tick().unwrap();
    assert_eq!(
        stage.renderer().frames[2].camera.position,
        Vector3::new(0.0, 0.0, 0.0)
    );
}

#[test]
fn scrolling_the_same_offset_twice_changes_nothing() {
    let mut stage = seeded_stage(3);
    stage.on_scroll(-400.0);
    stage.tick().unwrap();
    stage.on_scroll(-400.0);
    stage.tick().unwrap();
    let frames = &stage.renderer().frames;
    assert_eq!(frames[0].camera.position, frames[1].camera.position);
}

#[test]
fn resize_reaches_camera_and_renderer() {
    let mut stage = seeded_stage(4);
    stage.resize(640, 480);
    stage.tick().unwrap();
    assert_eq!(stage.renderer().size, (640, 480));
    let aspect = stage.renderer().frames[0].camera.projection.aspect;
    assert_eq!(aspect, 640.0 / 480.0);
}
