use softraster_math::{Vec2, Vec3, Vec4};

/// A mesh vertex. UV, normal, and tangent are optional per §3 — absence is
/// resolved downstream (flat-shaded faces, TBN fallback to the geometric
/// normal).
#[derive(Clone, Copy, Debug, Default)]
pub struct Vertex {
    pub position: Vec3,
    pub uv: Option<Vec2>,
    pub normal: Option<Vec3>,
    /// `w` in `{-1, +1}` carries bitangent handedness.
    pub tangent: Option<Vec4>,
}

impl Vertex {
    pub fn new(position: Vec3) -> Vertex {
        Vertex { position, uv: None, normal: None, tangent: None }
    }

    pub fn with_uv(mut self, uv: Vec2) -> Vertex {
        self.uv = Some(uv);
        self
    }

    pub fn with_normal(mut self, normal: Vec3) -> Vertex {
        self.normal = Some(normal);
        self
    }

    pub fn with_tangent(mut self, tangent: Vec4) -> Vertex {
        self.tangent = Some(tangent);
        self
    }
}
