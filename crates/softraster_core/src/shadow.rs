//! Shadow-map generation and PCF sampling (§4.F). Directional and spot
//! lights only — point lights have no single-map caster in scope.

use softraster_math::{Mat3, Mat4, Vec2, Vec3, Vec4};

use crate::camera::{Camera, Projection};
use crate::clip::clip_against_plane;
use crate::light::{Light, LightKind};
use crate::material::AlphaMode;
use crate::mesh::Mesh;
use crate::projector::ProjectedVertex;
use crate::rasterizer::{draw_depth_triangle, draw_transmission_triangle, ColorBuffer, DepthBuffer};

const MIN_NEAR: f32 = 0.01;
const MIN_W: f32 = 1e-5;

/// Bias parameters for `get_shadow_factor`. Exposed so a host can retune
/// per-scene; defaults are the conservative middle ground common in
/// real-time shadow mapping (no single correct value is implied by the
/// governing spec, only the bias formula's shape).
#[derive(Clone, Copy, Debug)]
pub struct ShadowBias {
    pub constant: f32,
    pub slope: f32,
    pub texel: f32,
    pub max_bias: f32,
    pub normal_bias_min: f32,
    pub normal_bias: f32,
    pub pcf_radius: i32,
    pub strength: f32,
}

impl Default for ShadowBias {
    fn default() -> ShadowBias {
        ShadowBias { constant: 0.001, slope: 0.003, texel: 1.0, max_bias: 0.01, normal_bias_min: 0.01, normal_bias: 0.05, pcf_radius: 1, strength: 1.0 }
    }
}

/// One light's rendered depth (and, for colored glass, transmission) map.
pub struct ShadowMap {
    pub light_view_projection: Mat4,
    pub depth: DepthBuffer,
    pub transmission: Option<ColorBuffer>,
    pub bias: ShadowBias,
}

#[derive(Clone, Copy)]
struct ClipSpaceVertex {
    clip: Vec4,
    uv: Vec2,
}

fn lerp_clip_space_vertex(a: &ClipSpaceVertex, b: &ClipSpaceVertex, t: f32) -> ClipSpaceVertex {
    ClipSpaceVertex { clip: a.clip + (b.clip - a.clip) * t, uv: Vec2::lerp(a.uv, b.uv, t) }
}

/// Builds the light-space camera for a shadow-casting light (§4.F step 1).
/// Returns `None` for light kinds with no single-map caster (point lights,
/// ambient, light probes) or a zero-radius scene (nothing to fit a frustum
/// to).
fn light_camera(light: &Light, scene_center: Vec3, scene_radius: f32) -> Option<Camera> {
    if scene_radius <= 0.0 {
        return None;
    }
    match &light.kind {
        LightKind::Directional { .. } => {
            let dir = light.transformed_direction()?;
            let position = scene_center - dir * (1.5 * scene_radius);
            let up = if dir.y.abs() > 0.999 { Vec3::new(0.0, 0.0, 1.0) } else { Vec3::UP };
            let view = Mat4::look_at(position, scene_center, up);
            let half = 1.2 * scene_radius;
            let proj = Mat4::orthographic(half, half, 0.0, 3.0 * scene_radius);
            let projection = Projection::Orthographic { half_width: half, half_height: half, near: 0.0, far: 3.0 * scene_radius };
            let base = Camera::new(position, softraster_math::Quaternion::IDENTITY, 1.0, projection);
            Some(base.with_view_override(position, view, proj))
        }
        LightKind::Spot { angle_rad, range, .. } => {
            let position = light.transformed_position()?;
            let dir = light.transformed_direction()?;
            let dist = (position - scene_center).length();
            let near = MIN_NEAR.max(dist - scene_radius);
            let far = (near + 0.1).max(range.min(dist + scene_radius));
            let up = if dir.y.abs() > 0.999 { Vec3::new(0.0, 0.0, 1.0) } else { Vec3::UP };
            let view = Mat4::look_at(position, position + dir, up);
            let fov_deg = (2.0 * angle_rad).to_degrees();
            let proj = Mat4::perspective(fov_deg, 1.0, near, far);
            let projection = Projection::Perspective { fov_deg, near, far };
            let base = Camera::new(position, softraster_math::Quaternion::IDENTITY, 1.0, projection);
            Some(base.with_view_override(position, view, proj))
        }
        _ => None,
    }
}

/// Renders one light's shadow/transmission maps for the whole scene (§4.F
/// steps 2-4). `resolution` sizes the depth (and, if any BLEND face is
/// present, transmission) buffers.
pub fn render_shadow_map(light: &Light, meshes: &[Mesh], scene_center: Vec3, scene_radius: f32, resolution: (u32, u32), bias: ShadowBias) -> Option<ShadowMap> {
    let camera = light_camera(light, scene_center, scene_radius)?;
    let light_dir = light.transformed_direction()?;
    let light_vp = camera.view_projection();

    let (width, height) = resolution;
    let mut depth = DepthBuffer::new(width, height);
    let mut transmission: Option<ColorBuffer> = None;

    for mesh in meshes {
        let world_aabb = mesh.world_aabb();
        if camera.frustum().aabb_is_outside(world_aabb.min, world_aabb.max) {
            continue;
        }

        let model = mesh.model_matrix();
        let model_upper = Mat3::from_mat4_upper_left(&model);
        let inverse_model = model_upper.inverse().unwrap_or(Mat3::IDENTITY);
        let light_dir_model = inverse_model * light_dir;
        let light_vp_model = light_vp * model;

        for face in &mesh.faces {
            let header = face.material.as_ref().map(|m| m.header());
            if header.map(|h| h.alpha_mode == AlphaMode::Blend).unwrap_or(false) {
                render_transmission_face(face, &light_vp_model, width, height, transmission.get_or_insert_with(|| ColorBuffer::new(width, height)));
                continue;
            }

            let normal = face.effective_normal();
            if normal.dot(light_dir_model) > 0.0 && !face.double_sided {
                continue;
            }

            let Some(clipped) = clip_face_to_light(face, &light_vp_model) else { continue };
            if clipped.len() < 3 {
                continue;
            }
            let vertices = project_clip_vertices(&clipped, width, height);
            for i in 1..vertices.len() - 1 {
                draw_depth_triangle(&vertices[0], &vertices[i], &vertices[i + 1], face.material.as_deref(), &mut depth);
            }
        }
    }

    Some(ShadowMap { light_view_projection: light_vp, depth, transmission, bias })
}

fn clip_face_to_light(face: &crate::mesh::Face, light_vp_model: &Mat4) -> Option<Vec<ClipSpaceVertex>> {
    if face.vertices.len() < 3 {
        return None;
    }
    let mut verts: Vec<ClipSpaceVertex> = face
        .vertices
        .iter()
        .map(|v| ClipSpaceVertex { clip: *light_vp_model * Vec4::from_vec3(v.position, 1.0), uv: v.uv.unwrap_or(Vec2::ZERO) })
        .collect();

    // Seven-plane homogeneous clip: {w >= MIN_W, x >= -w, x <= w, y >= -w,
    // y <= w, z >= -w, z <= w} (§4.F step 3).
    let planes: [fn(&ClipSpaceVertex) -> f32; 7] = [
        |v| v.clip.w - MIN_W,
        |v| v.clip.x + v.clip.w,
        |v| v.clip.w - v.clip.x,
        |v| v.clip.y + v.clip.w,
        |v| v.clip.w - v.clip.y,
        |v| v.clip.z + v.clip.w,
        |v| v.clip.w - v.clip.z,
    ];
    for plane in planes {
        verts = clip_against_plane(&verts, plane, lerp_clip_space_vertex);
        if verts.len() < 3 {
            return Some(verts);
        }
    }
    Some(verts)
}

fn project_clip_vertices(verts: &[ClipSpaceVertex], width: u32, height: u32) -> Vec<ProjectedVertex> {
    verts
        .iter()
        .map(|v| {
            let ndc = v.clip.perspective_divide();
            let inv_w = if v.clip.w.abs() > 1e-12 { 1.0 / v.clip.w } else { 0.0 };
            let screen = Vec2::new((ndc.x * 0.5 + 0.5) * width as f32, (0.5 - ndc.y * 0.5) * height as f32);
            ProjectedVertex { screen, ndc_z: ndc.z, inv_w, world_position: Vec3::ZERO, normal: Vec3::UP, uv: v.uv, tangent: Vec4::new(1.0, 0.0, 0.0, 1.0) }
        })
        .collect()
}

fn render_transmission_face(face: &crate::mesh::Face, light_vp_model: &Mat4, width: u32, height: u32, transmission: &mut ColorBuffer) {
    let Some(material) = &face.material else { return };
    let Some(clipped) = clip_face_to_light(face, light_vp_model) else { return };
    if clipped.len() < 3 {
        return;
    }
    let vertices = project_clip_vertices(&clipped, width, height);
    for i in 1..vertices.len() - 1 {
        draw_transmission_triangle(&vertices[0], &vertices[i], &vertices[i + 1], material, transmission);
    }
}

/// `getShadowFactor(world, N) -> RGB` (§4.F sampling). Offsets the sample
/// point along the normal to fight acne, rejects samples outside the
/// light's clip volume, and averages a `(2r+1)^2` PCF window.
pub fn get_shadow_factor(map: &ShadowMap, world: Vec3, normal: Vec3, to_light: Vec3) -> Vec3 {
    let cos_theta = normal.dot(to_light).max(0.0);
    let normal_offset = map.bias.normal_bias_min + (map.bias.normal_bias - map.bias.normal_bias_min) * (1.0 - cos_theta);
    let offset_world = world + normal * normal_offset;

    let clip = map.light_view_projection.transform_vector4(Vec4::from_vec3(offset_world, 1.0));
    if clip.w <= MIN_W {
        return Vec3::ONE * 255.0;
    }
    let ndc = clip.perspective_divide();
    if ndc.x < -1.0 || ndc.x > 1.0 || ndc.y < -1.0 || ndc.y > 1.0 || ndc.z < -1.0 || ndc.z > 1.0 {
        return Vec3::ONE * 255.0;
    }

    let u = ndc.x * 0.5 + 0.5;
    let v = 0.5 - ndc.y * 0.5;
    let current_depth = ndc.z;

    let width = map.depth.width as f32;
    let height = map.depth.height as f32;
    let texel_bias = map.bias.texel * 2.0 / width.min(height).max(1.0);
    let bias = (map.bias.constant + map.bias.slope * (1.0 - cos_theta) + texel_bias).min(map.bias.max_bias);

    let center_x = (u * width) as i64;
    let center_y = (v * height) as i64;

    let mut lit_samples = 0.0_f32;
    let mut total_samples = 0.0_f32;
    let radius = map.bias.pcf_radius;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let x = center_x + dx as i64;
            let y = center_y + dy as i64;
            if x < 0 || y < 0 || x >= map.depth.width as i64 || y >= map.depth.height as i64 {
                continue;
            }
            total_samples += 1.0;
            let stored = map.depth.get(x as u32, y as u32);
            if current_depth - bias <= stored {
                lit_samples += 1.0;
            }
        }
    }

    if total_samples <= 0.0 {
        return Vec3::ONE * 255.0;
    }
    let lit_fraction = lit_samples / total_samples;
    let shadow = 1.0 - (1.0 - lit_fraction) * map.bias.strength;

    let mut color = Vec3::splat(shadow * 255.0);
    if let Some(transmission) = &map.transmission {
        let tx = (u * width) as i64;
        let ty = (v * height) as i64;
        if tx >= 0 && ty >= 0 && tx < map.depth.width as i64 && ty < map.depth.height as i64 {
            let texel = transmission.get(tx as u32, ty as u32);
            let tint = Vec3::new(texel[0] as f32, texel[1] as f32, texel[2] as f32) / 255.0;
            color = color * tint;
        }
    }
    color
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vertex::Vertex;

    fn unit_quad_mesh() -> Mesh {
        let face = crate::mesh::Face::new(vec![
            Vertex::new(Vec3::new(-1.0, 0.0, -1.0)),
            Vertex::new(Vec3::new(1.0, 0.0, -1.0)),
            Vertex::new(Vec3::new(1.0, 0.0, 1.0)),
            Vertex::new(Vec3::new(-1.0, 0.0, 1.0)),
        ]);
        Mesh::new(vec![face])
    }

    #[test]
    fn point_light_has_no_shadow_caster() {
        let light = Light::new(LightKind::Point { position: Vec3::ZERO, range: 10.0 }, Vec3::splat(255.0), 1.0);
        assert!(light_camera(&light, Vec3::ZERO, 5.0).is_none());
    }

    #[test]
    fn directional_light_camera_looks_toward_scene_center() {
        let light = Light::new(LightKind::Directional { direction: Vec3::new(0.0, -1.0, 0.0) }, Vec3::splat(255.0), 1.0);
        let camera = light_camera(&light, Vec3::ZERO, 5.0).unwrap();
        assert!(!camera.frustum().point_is_outside(Vec3::ZERO));
    }

    #[test]
    fn unshadowed_point_outside_light_frustum_reports_fully_lit() {
        let light = Light::new(LightKind::Directional { direction: Vec3::new(0.0, -1.0, 0.0) }, Vec3::splat(255.0), 1.0);
        let mesh = unit_quad_mesh();
        let map = render_shadow_map(&light, &[mesh], Vec3::ZERO, 5.0, (32, 32), ShadowBias::default()).unwrap();
        let far_away = Vec3::new(1000.0, 1000.0, 1000.0);
        let factor = get_shadow_factor(&map, far_away, Vec3::UP, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(factor, Vec3::ONE * 255.0);
    }
}
