//! The external mesh/texture loader contract (§6), carried forward as a
//! plain data shape without any file-format parsing behind it. A real
//! loader (glTF, OBJ, ...) would build one of these and hand it to
//! `into_mesh`/`into_texture`; the in-memory demo scene does the same thing
//! by constructing the shape directly.

use softraster_math::{Aabb, Vec3};

use crate::mesh::{Face, Mesh};
use crate::texture::{ColorSpace, TexelData, Texture};

/// `{faces, localAABB, localSphere}` from the loader contract.
pub struct MeshSource {
    pub faces: Vec<Face>,
    pub local_aabb: Option<Aabb>,
    pub local_sphere: Option<(Vec3, f32)>,
}

impl MeshSource {
    pub fn new(faces: Vec<Face>) -> MeshSource {
        MeshSource { faces, local_aabb: None, local_sphere: None }
    }

    /// Builds a render-ready `Mesh`, trusting the loader's precomputed
    /// bounds when both are supplied and recomputing from vertex data
    /// otherwise.
    pub fn into_mesh(self) -> Mesh {
        match (self.local_aabb, self.local_sphere) {
            (Some(aabb), Some(sphere)) => Mesh::with_bounds(self.faces, aabb, sphere),
            _ => Mesh::new(self.faces),
        }
    }
}

/// `{data, width, height, colorSpace}` from the loader contract.
pub struct TextureSource {
    pub data: TexelData,
    pub width: u32,
    pub height: u32,
    pub color_space: ColorSpace,
}

impl TextureSource {
    pub fn into_texture(self) -> Texture {
        Texture::new(self.width, self.height, self.data, self.color_space)
    }
}
