use std::sync::Arc;

use softraster_math::{Aabb, EulerAngles, Mat4, Vec3};

use crate::material::Material;
use crate::vertex::Vertex;

/// An ordered polygon of >= 3 vertices; the rasterizer fan-triangulates it.
#[derive(Clone, Debug)]
pub struct Face {
    pub vertices: Vec<Vertex>,
    pub normal: Option<Vec3>,
    pub material: Option<Arc<Material>>,
    pub flat_color: Option<Vec3>,
    pub double_sided: bool,
}

impl Face {
    pub fn new(vertices: Vec<Vertex>) -> Face {
        Face { vertices, normal: None, material: None, flat_color: None, double_sided: false }
    }

    /// The geometric (winding-derived) normal of the polygon, via Newell's
    /// method, used when no explicit face normal was supplied.
    pub fn geometric_normal(&self) -> Vec3 {
        let mut normal = Vec3::ZERO;
        let verts = &self.vertices;
        for i in 0..verts.len() {
            let a = verts[i].position;
            let b = verts[(i + 1) % verts.len()].position;
            normal += Vec3::new(
                (a.y - b.y) * (a.z + b.z),
                (a.z - b.z) * (a.x + b.x),
                (a.x - b.x) * (a.y + b.y),
            );
        }
        normal.normalize()
    }

    pub fn effective_normal(&self) -> Vec3 {
        self.normal.unwrap_or_else(|| self.geometric_normal())
    }
}

/// A local-space transform: translation, Euler rotation, nonuniform scale
/// (§3).
#[derive(Clone, Copy, Debug, Default)]
pub struct Transform {
    pub translation: Vec3,
    pub orientation: EulerAngles,
    pub scale: Vec3,
}

impl Transform {
    pub fn identity() -> Transform {
        Transform { translation: Vec3::ZERO, orientation: EulerAngles::IDENTITY, scale: Vec3::ONE }
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::trs_euler_zyx(self.translation, self.orientation, self.scale)
    }
}

/// A set of faces plus a local transform and the bounds derived from current
/// vertex positions. Invariant: `local_aabb`/`local_sphere` reflect the
/// current faces — callers must call `recompute_bounds()` after editing
/// `faces`.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub faces: Vec<Face>,
    pub transform: Transform,
    local_aabb: Aabb,
    local_sphere_center: Vec3,
    local_sphere_radius: f32,
}

impl Mesh {
    pub fn new(faces: Vec<Face>) -> Mesh {
        let mut mesh = Mesh {
            faces,
            transform: Transform::identity(),
            local_aabb: Aabb::EMPTY,
            local_sphere_center: Vec3::ZERO,
            local_sphere_radius: 0.0,
        };
        mesh.recompute_bounds();
        mesh
    }

    /// Builds a mesh trusting precomputed bounds instead of deriving them
    /// from vertex data (§6 loader contract: `localAABB`/`localSphere` are
    /// loader-suppliable).
    pub fn with_bounds(faces: Vec<Face>, local_aabb: Aabb, local_sphere: (Vec3, f32)) -> Mesh {
        Mesh {
            faces,
            transform: Transform::identity(),
            local_aabb,
            local_sphere_center: local_sphere.0,
            local_sphere_radius: local_sphere.1,
        }
    }

    pub fn recompute_bounds(&mut self) {
        let points: Vec<Vec3> = self.faces.iter().flat_map(|f| f.vertices.iter().map(|v| v.position)).collect();
        self.local_aabb = Aabb::from_points(&points);
        if self.local_aabb.is_empty() {
            self.local_sphere_center = Vec3::ZERO;
            self.local_sphere_radius = 0.0;
            return;
        }
        self.local_sphere_center = self.local_aabb.center();
        self.local_sphere_radius = points
            .iter()
            .map(|p| (*p - self.local_sphere_center).length())
            .fold(0.0_f32, f32::max);
    }

    pub fn local_aabb(&self) -> Aabb {
        self.local_aabb
    }

    pub fn local_sphere(&self) -> (Vec3, f32) {
        (self.local_sphere_center, self.local_sphere_radius)
    }

    pub fn model_matrix(&self) -> Mat4 {
        self.transform.to_matrix()
    }

    pub fn world_aabb(&self) -> Aabb {
        self.local_aabb.transformed(&self.model_matrix())
    }
}
