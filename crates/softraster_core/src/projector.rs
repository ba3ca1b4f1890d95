use std::sync::Arc;

use softraster_math::{Mat3, Mat4, Vec2, Vec3, Vec4};

use crate::camera::Camera;
use crate::clip::clip_against_plane;
use crate::material::Material;
use crate::mesh::{Face, Mesh};

/// A vertex carried through the model/view transform and near-plane clip,
/// before projection.
#[derive(Clone, Copy, Debug)]
struct ClipVertex {
    world: Vec3,
    view: Vec3,
    normal: Vec3,
    uv: Vec2,
    tangent: Vec4,
}

fn lerp_clip_vertex(a: &ClipVertex, b: &ClipVertex, t: f32) -> ClipVertex {
    ClipVertex {
        world: Vec3::lerp(a.world, b.world, t),
        view: Vec3::lerp(a.view, b.view, t),
        normal: Vec3::lerp(a.normal, b.normal, t),
        uv: Vec2::lerp(a.uv, b.uv, t),
        tangent: a.tangent + (b.tangent - a.tangent) * t,
    }
}

/// A single projected, screen-space vertex, retaining everything the
/// rasterizer needs to interpolate perspective-correctly (§4.C/§4.D).
#[derive(Clone, Copy, Debug)]
pub struct ProjectedVertex {
    pub screen: Vec2,
    pub ndc_z: f32,
    pub inv_w: f32,
    pub world_position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub tangent: Vec4,
}

#[derive(Clone, Copy, Debug)]
pub struct FaceDepthInfo {
    pub min: f32,
    pub max: f32,
    pub avg: f32,
}

/// The fan-triangulated, clipped, projected view of one face (§3).
#[derive(Clone, Debug)]
pub struct ProjectedFace {
    pub vertices: Vec<ProjectedVertex>,
    pub world_center: Vec3,
    pub normal: Vec3,
    pub depth: FaceDepthInfo,
    pub material: Option<Arc<Material>>,
    pub flat_color: Option<Vec3>,
    pub double_sided: bool,
}

/// Projects one face through model -> world -> view, near-plane clips, cull
/// tests, and projects to screen space. Returns `None` when the face is
/// dropped (degenerate or fully behind the near plane, or backface-culled) —
/// §7's "degenerate geometry: silently skipped".
pub fn project_face(
    face: &Face,
    model: &Mat4,
    normal_matrix: &Mat3,
    camera: &Camera,
    viewport_width: f32,
    viewport_height: f32,
    flip_culling: bool,
) -> Option<ProjectedFace> {
    if face.vertices.len() < 3 {
        return None;
    }

    let view = camera.view();
    let clip_verts: Vec<ClipVertex> = face
        .vertices
        .iter()
        .map(|v| {
            let world = model.transform_point(v.position);
            let view_pos = view.transform_point(world);
            let normal = v.normal.map(|n| *normal_matrix * n).unwrap_or(Vec3::UP).normalize();
            let uv = v.uv.unwrap_or(Vec2::ZERO);
            let tangent = v
                .tangent
                .map(|t| {
                    let transformed = (*normal_matrix * Vec3::new(t.x, t.y, t.z)).normalize();
                    Vec4::new(transformed.x, transformed.y, transformed.z, t.w)
                })
                .unwrap_or(Vec4::new(1.0, 0.0, 0.0, 1.0));
            ClipVertex { world, view: view_pos, normal, uv, tangent }
        })
        .collect();

    let near = camera.near();
    let clipped = clip_against_plane(&clip_verts, |v| -v.view.z - near, lerp_clip_vertex);
    if clipped.len() < 3 {
        return None;
    }

    // Backface cull using the clipped polygon's own geometric normal in
    // view space; camera sits at the view-space origin so any clipped
    // vertex's position doubles as the direction toward it.
    let view_normal = polygon_normal(&clipped);
    let facing_dot = view_normal.dot(clipped[0].view);
    let culled = if flip_culling { facing_dot < 0.0 } else { facing_dot > 0.0 };
    if culled && !face.double_sided {
        return None;
    }

    let proj = camera.projection_matrix();
    let mut min_depth = f32::MAX;
    let mut max_depth = f32::MIN;
    let mut sum_depth = 0.0_f32;
    let mut world_center = Vec3::ZERO;

    let vertices: Vec<ProjectedVertex> = clipped
        .iter()
        .map(|v| {
            let clip = proj * Vec4::from_vec3(v.view, 1.0);
            let ndc = clip.perspective_divide();
            let inv_w = if clip.w.abs() > 1e-12 { 1.0 / clip.w } else { 0.0 };
            let screen = Vec2::new((ndc.x * 0.5 + 0.5) * viewport_width, (0.5 - ndc.y * 0.5) * viewport_height);
            let depth = -v.view.z;
            min_depth = min_depth.min(depth);
            max_depth = max_depth.max(depth);
            sum_depth += depth;
            world_center += v.world;
            ProjectedVertex { screen, ndc_z: ndc.z, inv_w, world_position: v.world, normal: v.normal, uv: v.uv, tangent: v.tangent }
        })
        .collect();

    world_center *= 1.0 / vertices.len() as f32;
    let avg_depth = sum_depth / vertices.len() as f32;

    Some(ProjectedFace {
        vertices,
        world_center,
        normal: face.normal.unwrap_or(view_normal),
        depth: FaceDepthInfo { min: min_depth, max: max_depth, avg: avg_depth },
        material: face.material.clone(),
        flat_color: face.flat_color,
        double_sided: face.double_sided,
    })
}

fn polygon_normal(verts: &[ClipVertex]) -> Vec3 {
    let mut normal = Vec3::ZERO;
    for i in 0..verts.len() {
        let a = verts[i].view;
        let b = verts[(i + 1) % verts.len()].view;
        normal += Vec3::new((a.y - b.y) * (a.z + b.z), (a.z - b.z) * (a.x + b.x), (a.x - b.x) * (a.y + b.y));
    }
    normal.normalize()
}

/// Projects every face of a mesh, building the model/normal matrices once
/// (§4.C step 1).
pub fn project_mesh(mesh: &Mesh, camera: &Camera, viewport_width: f32, viewport_height: f32, flip_culling: bool) -> Vec<ProjectedFace> {
    let model = mesh.model_matrix();
    let normal_matrix = Mat3::normal_matrix(&model);
    mesh.faces
        .iter()
        .filter_map(|face| project_face(face, &model, &normal_matrix, camera, viewport_width, viewport_height, flip_culling))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Projection;
    use crate::vertex::Vertex;
    use softraster_math::Quaternion;

    fn triangle_facing_camera() -> Face {
        Face::new(vec![
            Vertex::new(Vec3::new(-1.0, -1.0, 0.0)),
            Vertex::new(Vec3::new(1.0, -1.0, 0.0)),
            Vertex::new(Vec3::new(0.0, 1.0, 0.0)),
        ])
    }

    #[test]
    fn triangle_facing_camera_survives_culling() {
        let camera = Camera::new(Vec3::new(0.0, 0.0, 5.0), Quaternion::IDENTITY, 1.0, Projection::Perspective { fov_deg: 60.0, near: 0.1, far: 100.0 });
        let face = triangle_facing_camera();
        let model = Mat4::IDENTITY;
        let normal_matrix = Mat3::IDENTITY;
        let projected = project_face(&face, &model, &normal_matrix, &camera, 800.0, 600.0, false);
        assert!(projected.is_some());
    }

    #[test]
    fn triangle_fully_behind_near_plane_is_dropped() {
        let camera = Camera::new(Vec3::ZERO, Quaternion::IDENTITY, 1.0, Projection::Perspective { fov_deg: 60.0, near: 1.0, far: 100.0 });
        let face = Face::new(vec![
            Vertex::new(Vec3::new(-1.0, -1.0, 10.0)),
            Vertex::new(Vec3::new(1.0, -1.0, 10.0)),
            Vertex::new(Vec3::new(0.0, 1.0, 10.0)),
        ]);
        let model = Mat4::IDENTITY;
        let normal_matrix = Mat3::IDENTITY;
        let projected = project_face(&face, &model, &normal_matrix, &camera, 800.0, 600.0, false);
        assert!(projected.is_none());
    }
}
