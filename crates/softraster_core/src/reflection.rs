//! Planar mirror reflection: unique-mirror-plane collection, the mirrored
//! camera with Lengyel oblique near-clip, and a pooled off-screen buffer per
//! plane (§4.G).

use std::collections::HashMap;

use softraster_math::{Mat4, Plane, Vec4};

use crate::camera::{Camera, Projection};
use crate::fragment::{make_shader, LightingContext};
use crate::material::AlphaMode;
use crate::mesh::Mesh;
use crate::projector::{project_mesh, ProjectedFace};
use crate::rasterizer::{draw_face, ColorBuffer, DepthBuffer};

pub type PlaneKey = (i64, i64, i64, i64);

const QUANTIZE_SCALE: f32 = 1.0e4;

pub fn quantize_plane(plane: &Plane) -> PlaneKey {
    let n = plane.normal.normalize();
    let q = |v: f32| (v * QUANTIZE_SCALE).round() as i64;
    (q(n.x), q(n.y), q(n.z), q(plane.d))
}

/// One rendered mirror view plus the plane it was rendered from.
pub struct ReflectionBuffer {
    pub color: ColorBuffer,
    pub plane: Plane,
}

/// Size-keyed freelist: released buffers return here instead of being
/// dropped, per §3's reflection-buffer lifecycle.
#[derive(Default)]
pub struct ReflectionPool {
    freelist: HashMap<(u32, u32), Vec<ColorBuffer>>,
}

impl ReflectionPool {
    pub fn new() -> ReflectionPool {
        ReflectionPool::default()
    }

    fn acquire(&mut self, width: u32, height: u32) -> ColorBuffer {
        match self.freelist.get_mut(&(width, height)).and_then(|bucket| bucket.pop()) {
            Some(mut buf) => {
                buf.clear([0, 0, 0, 0]);
                buf
            }
            None => ColorBuffer::new(width, height),
        }
    }

    /// Returns a buffer to the freelist; call when no remaining face
    /// references its plane.
    pub fn release(&mut self, buffer: ColorBuffer) {
        self.freelist.entry((buffer.width, buffer.height)).or_default().push(buffer);
    }
}

/// Scans every face for a material that carries a `mirror_plane`, deduping
/// by quantized plane key (§4.G: "collect unique mirror planes").
pub fn collect_unique_planes(meshes: &[Mesh]) -> Vec<Plane> {
    let mut seen = HashMap::new();
    for mesh in meshes {
        for face in &mesh.faces {
            let Some(material) = &face.material else { continue };
            let Some(plane) = material.header().mirror_plane else { continue };
            seen.entry(quantize_plane(&plane)).or_insert(plane);
        }
    }
    seen.into_values().collect()
}

/// Rigid-transform plane mapping: valid because view matrices carry no
/// scale, so transforming a point-on-plane plus the normal as a direction
/// and re-deriving `d` is equivalent to the general inverse-transpose rule.
fn transform_plane_rigid(plane: &Plane, m: &Mat4) -> Plane {
    let point_on_plane = plane.normal * -plane.d;
    let transformed_point = m.transform_point(point_on_plane);
    let transformed_normal = m.transform_vector3(plane.normal).normalize();
    Plane::from_point_normal(transformed_point, transformed_normal)
}

/// Lengyel's oblique near-plane clip (§4.G step 1): replaces the
/// projection's z row so the mirror plane, expressed in the reflected
/// camera's view space, becomes the new near plane.
fn oblique_near_clip(proj: Mat4, camera_space_plane: Vec4) -> Mat4 {
    let sgn = |v: f32| if v > 0.0 { 1.0 } else if v < 0.0 { -1.0 } else { 0.0 };
    let m00 = proj.row(0).x;
    let m11 = proj.row(1).y;
    let m22 = proj.row(2).z;
    let m32 = proj.row(3).z;

    let q = Vec4::new(sgn(camera_space_plane.x) / m00, sgn(camera_space_plane.y) / m11, -1.0, (1.0 + m22) / m32);

    let denom = camera_space_plane.dot(q);
    if denom.abs() < 1e-12 {
        return proj;
    }
    let c = camera_space_plane * (2.0 / denom);

    let mut out = proj;
    out.set_row(2, c - proj.row(3));
    out
}

/// Builds the mirrored camera for one reflection plane (§4.G step 1).
fn mirrored_camera(plane: &Plane, camera: &Camera) -> Camera {
    let r = plane.reflection_matrix();
    let mirrored_position = r.transform_point(camera.position);
    let reflected_view = camera.view() * r;

    let mut camera_space_plane = transform_plane_rigid(plane, &reflected_view);
    if plane.distance(camera.position) < 0.0 {
        camera_space_plane = Plane::new(-camera_space_plane.normal, -camera_space_plane.d);
    }
    let plane_vec = Vec4::new(camera_space_plane.normal.x, camera_space_plane.normal.y, camera_space_plane.normal.z, camera_space_plane.d);

    let reflected_proj = oblique_near_clip(camera.projection_matrix(), plane_vec);

    // The oblique clip now owns the near plane; report a near distance small
    // enough that the geometry stage's ordinary view-space near clip (which
    // still runs ahead of projection) doesn't also cut the mirrored view.
    let projection = match camera.projection {
        Projection::Perspective { fov_deg, far, .. } => Projection::Perspective { fov_deg, near: 1e-4, far },
        Projection::Orthographic { half_width, half_height, far, .. } => Projection::Orthographic { half_width, half_height, near: 1e-4, far },
    };
    let base = Camera::new(mirrored_position, softraster_math::Quaternion::IDENTITY, camera.aspect, projection);
    base.with_view_override(mirrored_position, reflected_view, reflected_proj)
}

fn context_from_viewpoint<'a>(base: &LightingContext<'a>, viewpoint: softraster_math::Vec3) -> LightingContext<'a> {
    LightingContext {
        camera_position: viewpoint,
        lights: base.lights,
        shadows_enabled: base.shadows_enabled,
        lighting_enabled: base.lighting_enabled,
        sh_enabled: base.sh_enabled,
        sh_coefficients: base.sh_coefficients,
        gamma: base.gamma,
        world_matrix: base.world_matrix,
        shadow_factor: base.shadow_factor,
        reflections: base.reflections,
    }
}

fn references_plane(face: &ProjectedFace, key: PlaneKey) -> bool {
    face.material.as_ref().and_then(|m| m.header().mirror_plane).map(|p| quantize_plane(&p) == key).unwrap_or(false)
}

/// Renders one mirror plane's reflection buffer (§4.G steps 1-2): mirrors
/// the camera, projects with `flip_culling = true`, drops faces on the
/// camera's own side of the mirror and faces authored against this same
/// plane (self-recursion guard), then draws opaque-then-sorted-transparent
/// exactly like the main pass.
pub fn render_reflection(plane: &Plane, meshes: &[Mesh], camera: &Camera, viewport_width: u32, viewport_height: u32, resolution_scale: f32, base_context: &LightingContext, pool: &mut ReflectionPool) -> ReflectionBuffer {
    let width = ((viewport_width as f32 * resolution_scale).max(1.0)) as u32;
    let height = ((viewport_height as f32 * resolution_scale).max(1.0)) as u32;

    let mirror_cam = mirrored_camera(plane, camera);
    let key = quantize_plane(plane);
    let camera_distance = plane.distance(camera.position);

    let faces: Vec<ProjectedFace> = meshes
        .iter()
        .flat_map(|mesh| project_mesh(mesh, &mirror_cam, width as f32, height as f32, true))
        .filter(|face| !references_plane(face, key))
        .filter(|face| {
            let distance = plane.distance(face.world_center);
            distance.abs() < 1e-4 || distance.signum() == camera_distance.signum()
        })
        .collect();

    let mut color = pool.acquire(width, height);
    let mut depth = DepthBuffer::new(width, height);
    let context = context_from_viewpoint(base_context, mirror_cam.position);

    let (opaque, mut transparent): (Vec<_>, Vec<_>) = faces.into_iter().partition(|f| {
        f.material.as_ref().map(|m| m.header().alpha_mode != AlphaMode::Blend).unwrap_or(true)
    });

    for face in &opaque {
        let mut shader = make_shader(face.material.as_deref(), context.lighting_enabled);
        draw_face(face, shader.as_mut(), &context, &mut color, &mut depth, false);
    }

    transparent.sort_by(|a, b| b.depth.avg.partial_cmp(&a.depth.avg).unwrap_or(std::cmp::Ordering::Equal));
    for face in &transparent {
        let mut shader = make_shader(face.material.as_deref(), context.lighting_enabled);
        draw_face(face, shader.as_mut(), &context, &mut color, &mut depth, true);
    }

    ReflectionBuffer { color, plane: *plane }
}

/// Renders every unique mirror plane's reflection buffer for this frame
/// (§4.G). Call before the main pass so reflective materials can sample the
/// results while shading.
pub fn render_all_reflections(meshes: &[Mesh], camera: &Camera, viewport_width: u32, viewport_height: u32, resolution_scale: f32, base_context: &LightingContext, pool: &mut ReflectionPool) -> HashMap<PlaneKey, ReflectionBuffer> {
    collect_unique_planes(meshes)
        .iter()
        .map(|plane| (quantize_plane(plane), render_reflection(plane, meshes, camera, viewport_width, viewport_height, resolution_scale, base_context, pool)))
        .collect()
}

/// Samples a reflection buffer at on-screen UV coordinates with an optional
/// separable box blur, keeping the source alpha channel untouched (§4.G
/// step 3).
pub fn sample_reflection(buffer: &ReflectionBuffer, u: f32, v: f32, blur_radius: i32) -> [u8; 4] {
    let width = buffer.color.width;
    let height = buffer.color.height;
    if width == 0 || height == 0 {
        return [0, 0, 0, 0];
    }
    let cx = (u.clamp(0.0, 1.0) * (width - 1) as f32).round() as i64;
    let cy = (v.clamp(0.0, 1.0) * (height - 1) as f32).round() as i64;

    if blur_radius <= 0 {
        return buffer.color.get(cx.clamp(0, width as i64 - 1) as u32, cy.clamp(0, height as i64 - 1) as u32);
    }

    let mut sum = [0.0_f32; 3];
    let alpha_at_center = buffer.color.get(cx.clamp(0, width as i64 - 1) as u32, cy.clamp(0, height as i64 - 1) as u32)[3];
    let mut count = 0.0_f32;
    for dy in -blur_radius..=blur_radius {
        for dx in -blur_radius..=blur_radius {
            let x = (cx + dx as i64).clamp(0, width as i64 - 1) as u32;
            let y = (cy + dy as i64).clamp(0, height as i64 - 1) as u32;
            let texel = buffer.color.get(x, y);
            sum[0] += texel[0] as f32;
            sum[1] += texel[1] as f32;
            sum[2] += texel[2] as f32;
            count += 1.0;
        }
    }
    [(sum[0] / count) as u8, (sum[1] / count) as u8, (sum[2] / count) as u8, alpha_at_center]
}

/// Sin/cos ripple displacement, the alternative image-space filter named
/// alongside the box blur (§4.G step 3). `time` drives the animated phase.
pub fn sample_reflection_rippled(buffer: &ReflectionBuffer, u: f32, v: f32, amplitude: f32, frequency: f32, time: f32) -> [u8; 4] {
    let width = buffer.color.width;
    let height = buffer.color.height;
    if width == 0 || height == 0 {
        return [0, 0, 0, 0];
    }
    let ripple_u = u + amplitude * (v * frequency + time).sin();
    let ripple_v = v + amplitude * (u * frequency + time).cos();
    let cx = (ripple_u.clamp(0.0, 1.0) * (width - 1) as f32).round() as u32;
    let cy = (ripple_v.clamp(0.0, 1.0) * (height - 1) as f32).round() as u32;
    buffer.color.get(cx, cy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::light::Light;
    use softraster_math::{SphericalHarmonics, Vec3};

    #[test]
    fn quantizing_plane_is_stable_under_tiny_perturbation() {
        let a = Plane::new(Vec3::UP, -1.0);
        let b = Plane::new(Vec3::new(0.0, 1.0 + 1e-7, 0.0), -1.0 + 1e-7);
        assert_eq!(quantize_plane(&a), quantize_plane(&b));
    }

    #[test]
    fn mirrored_camera_flips_to_the_opposite_side_of_the_plane() {
        let plane = Plane::from_point_normal(Vec3::ZERO, Vec3::UP);
        let camera = Camera::new(Vec3::new(0.0, 2.0, 5.0), softraster_math::Quaternion::IDENTITY, 1.0, Projection::Perspective { fov_deg: 60.0, near: 0.1, far: 100.0 });
        let mirrored = mirrored_camera(&plane, &camera);
        assert!(mirrored.position.y < 0.0);
    }

    #[test]
    fn reflection_pool_reuses_released_buffers() {
        let mut pool = ReflectionPool::new();
        let buf = pool.acquire(16, 16);
        pool.release(buf);
        let reused = pool.acquire(16, 16);
        assert_eq!((reused.width, reused.height), (16, 16));
    }

    #[allow(dead_code)]
    fn empty_context() -> LightingContext<'static> {
        static LIGHTS: [Light; 0] = [];
        LightingContext {
            camera_position: Vec3::ZERO,
            lights: &LIGHTS,
            shadows_enabled: false,
            lighting_enabled: true,
            sh_enabled: false,
            sh_coefficients: SphericalHarmonics::default(),
            gamma: 2.2,
            world_matrix: Mat4::IDENTITY,
            shadow_factor: None,
            reflections: None,
        }
    }
}
