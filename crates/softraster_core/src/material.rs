use softraster_math::{Plane, Vec3};
use std::sync::Arc;

use crate::texture::Texture;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlphaMode {
    Opaque,
    Mask,
    Blend,
}

/// Fields shared by every material variant (§3).
#[derive(Clone, Debug)]
pub struct MaterialHeader {
    pub opacity: f32,
    pub double_sided: bool,
    pub alpha_mode: AlphaMode,
    pub alpha_cutoff: f32,
    pub base_color_map: Option<Arc<Texture>>,
    pub mirror_plane: Option<Plane>,
    pub reflectivity: f32,
    pub fresnel: bool,
}

impl Default for MaterialHeader {
    fn default() -> Self {
        MaterialHeader {
            opacity: 1.0,
            double_sided: false,
            alpha_mode: AlphaMode::Opaque,
            alpha_cutoff: 0.5,
            base_color_map: None,
            mirror_plane: None,
            reflectivity: 0.0,
            fresnel: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PhongParams {
    pub diffuse: Vec3,
    pub ambient: Vec3,
    pub specular: Vec3,
    pub shininess: f32,
}

impl Default for PhongParams {
    fn default() -> Self {
        PhongParams { diffuse: Vec3::splat(255.0), ambient: Vec3::splat(32.0), specular: Vec3::splat(255.0), shininess: 32.0 }
    }
}

#[derive(Clone, Debug, Default)]
pub struct PbrParams {
    /// sRGB 0-255, matching the byte convention the texture sampler returns.
    pub albedo: Vec3,
    pub roughness: f32,
    pub metalness: f32,
    pub emissive: Vec3,
    pub emissive_intensity: f32,
    pub f0: f32,
    pub reflectance: f32,
    pub ior: f32,
    pub metallic_roughness_map: Option<Arc<Texture>>,
    pub normal_map: Option<Arc<Texture>>,
    pub occlusion_map: Option<Arc<Texture>>,
    pub emissive_map: Option<Arc<Texture>>,
    pub clearcoat: f32,
    pub clearcoat_roughness: f32,
    pub sheen_color: Vec3,
    pub sheen_roughness: f32,
    pub transmission: f32,
    pub thickness: f32,
    /// Linear `[0,1]` attenuation color for Beer-Lambert volumetric absorption.
    pub attenuation_color: Vec3,
    pub attenuation_distance: f32,
}

/// Sum type replacing the inheritance hierarchy a material class model would
/// use; the evaluator dispatches on the variant tag once per face (§9).
#[derive(Clone, Debug)]
pub enum Material {
    Basic(MaterialHeader),
    Phong(MaterialHeader, PhongParams),
    Gouraud(MaterialHeader, PhongParams),
    Pbr(MaterialHeader, PbrParams),
    Unlit(MaterialHeader),
}

impl Material {
    pub fn header(&self) -> &MaterialHeader {
        match self {
            Material::Basic(h) => h,
            Material::Phong(h, _) => h,
            Material::Gouraud(h, _) => h,
            Material::Pbr(h, _) => h,
            Material::Unlit(h) => h,
        }
    }
}
