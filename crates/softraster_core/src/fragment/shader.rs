use std::collections::HashMap;

use softraster_math::{Mat4, SphericalHarmonics, Vec2, Vec3, Vec4};

use crate::light::Light;
use crate::material::Material;
use crate::projector::ProjectedFace;
use crate::reflection::{PlaneKey, ReflectionBuffer};

/// Attributes perspective-correctly interpolated by the rasterizer at one
/// fragment (§4.D/§4.E).
#[derive(Clone, Copy, Debug)]
pub struct FragmentInput {
    pub world_position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub tangent: Vec4,
    pub ndc_z: f32,
    pub view_depth: f32,
    /// Pixel center in `[0,1]` screen space, used by reflective materials to
    /// sample a mirror's reflection buffer (§4.G step 3).
    pub screen_uv: Vec2,
}

#[derive(Clone, Copy, Debug)]
pub struct FragmentOutput {
    /// sRGB-encoded 0-255 RGB, ready to pack into the color buffer.
    pub color: Vec3,
    pub depth: Option<f32>,
    pub motion_vector: Option<Vec2>,
}

/// Everything the lighting strategies need that isn't carried per-fragment:
/// camera, scene lights, feature gates, and the shadow lookup (§4.E).
pub struct LightingContext<'a> {
    pub camera_position: Vec3,
    pub lights: &'a [Light],
    pub shadows_enabled: bool,
    /// §6 `enableLighting`: when false, every material shades as `Unlit`
    /// regardless of its own variant.
    pub lighting_enabled: bool,
    pub sh_enabled: bool,
    pub sh_coefficients: SphericalHarmonics,
    pub gamma: f32,
    pub world_matrix: Mat4,
    /// `(light_index, world_position, normal) -> RGB attenuation in [0,1]`.
    /// `None` when shadows are disabled or no caster produced a map. `Sync`
    /// so a whole `LightingContext` can be shared across the rasterizer's
    /// tiled dispatch.
    pub shadow_factor: Option<&'a (dyn Fn(usize, Vec3, Vec3) -> Vec3 + Sync)>,
    /// Reflection buffers keyed by quantized mirror plane, populated for the
    /// frame's main pass once §4.G has rendered every unique plane. `None`
    /// when reflections are disabled.
    pub reflections: Option<&'a HashMap<PlaneKey, ReflectionBuffer>>,
}

impl<'a> LightingContext<'a> {
    pub fn shadow_factor_for(&self, light_index: usize, world_position: Vec3, normal: Vec3) -> Vec3 {
        if !self.shadows_enabled {
            return Vec3::ONE * 255.0;
        }
        match self.shadow_factor {
            Some(f) => f(light_index, world_position, normal),
            None => Vec3::ONE * 255.0,
        }
    }
}

/// Wraps a Material Evaluator + Lighting Strategy pair; `initialize` runs
/// once per face (caching face-level data such as the flat-shaded normal for
/// Gouraud materials), `shade` runs once per fragment.
pub trait Shader {
    fn initialize(&mut self, face: &ProjectedFace, context: &LightingContext);
    fn shade(&mut self, input: &FragmentInput, context: &LightingContext) -> Option<FragmentOutput>;
    fn get_opacity(&self) -> f32;
}

/// Builds the shader appropriate for a material's variant (§9: the
/// evaluator/strategy pair is selected once, at `initialize`, not per call).
pub fn make_shader(material: Option<&Material>, lighting_enabled: bool) -> Box<dyn Shader> {
    match material {
        None => Box::new(super::material_shader::MaterialShader::unlit_fallback()),
        Some(m) => Box::new(super::material_shader::MaterialShader::for_material(m, lighting_enabled)),
    }
}
