//! Renders one frame of a small demo scene (a reflective floor, a lit cube,
//! and a directional shadow caster) and writes it out as a PNG.

use std::sync::Arc;

use softraster_core::{
    Camera, Face, Light, LightKind, Mesh, Projection, Renderer, RenderConfig, Scene, Transform,
};
use softraster_core::material::{AlphaMode, Material, MaterialHeader, PhongParams};
use softraster_core::vertex::Vertex;
use softraster_math::{EulerAngles, Plane, Quaternion, Vec3};

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;

fn quad_face(positions: [Vec3; 4], normal: Vec3, material: Arc<Material>) -> Face {
    let vertices = positions.iter().map(|p| Vertex::new(*p).with_normal(normal)).collect();
    let mut face = Face::new(vertices);
    face.normal = Some(normal);
    face.material = Some(material);
    face
}

fn reflective_floor() -> Mesh {
    let half = 6.0;
    let y = -2.0;
    let positions = [
        Vec3::new(-half, y, half),
        Vec3::new(half, y, half),
        Vec3::new(half, y, -half),
        Vec3::new(-half, y, -half),
    ];
    let mut header = MaterialHeader::default();
    header.mirror_plane = Some(Plane::from_point_normal(Vec3::new(0.0, y, 0.0), Vec3::UP));
    header.reflectivity = 0.35;
    header.fresnel = true;
    let material = Arc::new(Material::Phong(
        header,
        PhongParams { diffuse: Vec3::splat(120.0), ambient: Vec3::splat(30.0), specular: Vec3::splat(60.0), shininess: 16.0 },
    ));
    Mesh::new(vec![quad_face(positions, Vec3::UP, material)])
}

fn shaded_cube() -> Mesh {
    let half = 1.0;
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
    let header = MaterialHeader { alpha_mode: AlphaMode::Opaque, ..MaterialHeader::default() };
    let material = Arc::new(Material::Phong(
        header,
        PhongParams { diffuse: Vec3::new(200.0, 60.0, 60.0), ambient: Vec3::splat(20.0), specular: Vec3::splat(200.0), shininess: 48.0 },
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
    mesh.transform = Transform { translation: Vec3::new(0.0, -1.0, 0.0), orientation: EulerAngles::IDENTITY, scale: Vec3::ONE };
    mesh
}

fn demo_scene() -> Scene {
    let mut scene = Scene::default();
    scene.meshes.push(reflective_floor());
    scene.meshes.push(shaded_cube());

    let mut sun = Light::new(LightKind::Directional { direction: Vec3::new(-0.4, -1.0, -0.3).normalize() }, Vec3::splat(255.0), 1.2);
    sun.cast_shadow = true;
    scene.lights.push(sun);
    scene.lights.push(Light::new(LightKind::Ambient, Vec3::splat(255.0), 0.15));

    scene
}

fn main() {
    env_logger::init();

    let camera = Camera::new(
        Vec3::new(4.0, 3.0, 8.0),
        Quaternion::from_euler_zyx(-0.45, -0.25, 0.0),
        WIDTH as f32 / HEIGHT as f32,
        Projection::Perspective { fov_deg: 55.0, near: 0.1, far: 100.0 },
    );

    let mut renderer = Renderer::new(camera, RenderConfig::default(), WIDTH, HEIGHT).expect("non-zero viewport");
    let scene = demo_scene();

    let stats = renderer.tick(&scene);
    log::info!(
        "frame {}: {} opaque faces, {} transparent faces, {} shadow maps, {} reflection buffers",
        stats.frame_index,
        stats.opaque_faces,
        stats.transparent_faces,
        stats.shadow_maps_rendered,
        stats.reflection_buffers_rendered,
    );

    let output_path = std::env::args().nth(1).unwrap_or_else(|| "frame.png".to_string());
    let color = renderer.color_buffer();
    let mut rgba = Vec::with_capacity((color.width * color.height * 4) as usize);
    for pixel in color.as_slice() {
        rgba.extend_from_slice(pixel);
    }

    image::save_buffer(&output_path, &rgba, color.width, color.height, image::ColorType::Rgba8).expect("failed to write PNG");
    log::info!("wrote {output_path}");
}
