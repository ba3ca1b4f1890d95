//! End-to-end coverage of the frame orchestrator (§4.H): shadow mapping,
//! planar reflection, and picking wired together through one `tick()`,
//! exercised the way a host application would use the crate.

use std::sync::Arc;

use softraster_core::material::{Material, MaterialHeader, PhongParams};
use softraster_core::vertex::Vertex;
use softraster_core::{Camera, Face, Light, LightKind, Mesh, Projection, RenderConfig, Renderer, Scene, Transform};
use softraster_math::{EulerAngles, Plane, Quaternion, Vec3};

fn quad_face(positions: [Vec3; 4], normal: Vec3, material: Arc<Material>) -> Face {
    let vertices = positions.iter().map(|p| Vertex::new(*p).with_normal(normal)).collect();
    let mut face = Face::new(vertices);
    face.normal = Some(normal);
    face.material = Some(material);
    face
}

fn reflective_floor() -> Mesh {
    let half = 8.0;
    let y = -1.0;
    let positions = [
        Vec3::new(-half, y, half),
        Vec3::new(half, y, half),
        Vec3::new(half, y, -half),
        Vec3::new(-half, y, -half),
    ];
    let mut header = MaterialHeader::default();
    header.mirror_plane = Some(Plane::from_point_normal(Vec3::new(0.0, y, 0.0), Vec3::UP));
    header.reflectivity = 0.5;
    let material = Arc::new(Material::Phong(
        header,
        PhongParams { diffuse: Vec3::splat(150.0), ambient: Vec3::splat(40.0), specular: Vec3::splat(60.0), shininess: 16.0 },
    ));
    Mesh::new(vec![quad_face(positions, Vec3::UP, material)])
}

fn casting_cube() -> Mesh {
    let half = 0.75;
    let corners = [
        Vec3::new(-half, -half, -half),
        Vec3::new(half, -half, -half),
        Vec3::new(half, half, -half),
        Vec3::new(-half, half, -half),
        Vec3::new(-half, -half, half),
        Vec3::new(half, -half, half),
        Vec3::new(half, half, half),
        Vec3::new(-half, half, half),
    ];
    let material = Arc::new(Material::Phong(
        MaterialHeader::default(),
        PhongParams { diffuse: Vec3::new(220.0, 80.0, 80.0), ambient: Vec3::splat(20.0), specular: Vec3::splat(200.0), shininess: 48.0 },
    ));

    let faces = vec![
        quad_face([corners[0], corners[1], corners[2], corners[3]], Vec3::new(0.0, 0.0, -1.0), material.clone()),
        quad_face([corners[5], corners[4], corners[7], corners[6]], Vec3::new(0.0, 0.0, 1.0), material.clone()),
        quad_face([corners[4], corners[0], corners[3], corners[7]], Vec3::new(-1.0, 0.0, 0.0), material.clone()),
        quad_face([corners[1], corners[5], corners[6], corners[2]], Vec3::new(1.0, 0.0, 0.0), material.clone()),
        quad_face([corners[3], corners[2], corners[6], corners[7]], Vec3::new(0.0, 1.0, 0.0), material.clone()),
        quad_face([corners[4], corners[5], corners[1], corners[0]], Vec3::new(0.0, -1.0, 0.0), material),
    ];

    let mut mesh = Mesh::new(faces);
    mesh.transform = Transform { translation: Vec3::new(0.0, 0.5, 0.0), orientation: EulerAngles::IDENTITY, scale: Vec3::ONE };
    mesh
}

fn scene_with_floor_and_cube() -> Scene {
    let mut scene = Scene::default();
    scene.meshes.push(reflective_floor());
    scene.meshes.push(casting_cube());

    let mut sun = Light::new(LightKind::Directional { direction: Vec3::new(-0.3, -1.0, -0.2).normalize() }, Vec3::splat(255.0), 1.0);
    sun.cast_shadow = true;
    scene.lights.push(sun);
    scene.lights.push(Light::new(LightKind::Ambient, Vec3::splat(255.0), 0.2));

    scene
}

fn overhead_camera() -> Camera {
    Camera::new(
        Vec3::new(0.0, 4.0, 10.0),
        Quaternion::from_euler_zyx(0.0, -0.3, 0.0),
        4.0 / 3.0,
        Projection::Perspective { fov_deg: 50.0, near: 0.1, far: 100.0 },
    )
}

#[test]
fn full_frame_with_shadows_and_reflections_populates_both_subsystems() {
    let scene = scene_with_floor_and_cube();
    let mut renderer = Renderer::new(overhead_camera(), RenderConfig::default(), 160, 120).unwrap();

    let stats = renderer.tick(&scene);

    assert_eq!(stats.shadow_maps_rendered, 1, "the directional light is the only shadow caster in the scene");
    assert_eq!(stats.reflection_buffers_rendered, 1, "the floor contributes exactly one mirror plane");
    assert!(stats.opaque_faces > 0);
    assert_eq!(stats.transparent_faces, 0);
}

#[test]
fn disabling_shadows_and_reflections_skips_both_subsystems() {
    let scene = scene_with_floor_and_cube();
    let mut config = RenderConfig::default();
    config.enable_shadows = false;
    config.enable_reflection = false;
    let mut renderer = Renderer::new(overhead_camera(), config, 160, 120).unwrap();

    let stats = renderer.tick(&scene);

    assert_eq!(stats.shadow_maps_rendered, 0);
    assert_eq!(stats.reflection_buffers_rendered, 0);
    assert!(stats.opaque_faces > 0, "geometry still renders with both subsystems off");
}

#[test]
fn picking_finds_the_cube_above_the_floor_and_nothing_off_screen() {
    let scene = scene_with_floor_and_cube();
    let mut renderer = Renderer::new(overhead_camera(), RenderConfig::default(), 160, 120).unwrap();
    renderer.tick(&scene);

    let hit = renderer.pick(80, 60, &scene);
    assert!(hit.is_some(), "the screen center should land on either the cube or the floor");
    assert!(renderer.pick(159, 0, &scene).is_none(), "the far corner above the horizon should report no hit");
}

#[test]
fn repeated_ticks_reuse_pooled_reflection_buffers() {
    let scene = scene_with_floor_and_cube();
    let mut renderer = Renderer::new(overhead_camera(), RenderConfig::default(), 160, 120).unwrap();

    for _ in 0..3 {
        renderer.invalidate();
        let stats = renderer.tick(&scene);
        assert_eq!(stats.reflection_buffers_rendered, 1);
    }
}
