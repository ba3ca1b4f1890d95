use softraster_math::{Vec2, Vec3};

use crate::fragment::evaluator::{self, Surface};
use crate::fragment::lighting::{self, LightingStrategy};
use crate::fragment::shader::{FragmentInput, FragmentOutput, LightingContext, Shader};
use crate::material::{Material, MaterialHeader};
use crate::projector::ProjectedFace;
use crate::reflection;

/// Picks the Lighting Strategy for a material variant once, at shader
/// construction (§4.E, §9). `Gouraud` shares `Phong`'s surface math but is
/// flat-shaded: `initialize` evaluates the single cached color at the face
/// center instead of per fragment.
fn strategy_for(material: &Material, lighting_enabled: bool) -> LightingStrategy {
    if !lighting_enabled {
        return LightingStrategy::Unlit;
    }
    match material {
        Material::Basic(_) | Material::Unlit(_) => LightingStrategy::Unlit,
        Material::Phong(..) | Material::Gouraud(..) => LightingStrategy::BlinnPhong,
        Material::Pbr(..) => LightingStrategy::Pbr,
    }
}

fn is_flat_shaded(material: &Material) -> bool {
    matches!(material, Material::Gouraud(..))
}

/// The default `Shader`: combines the Material Evaluator (`evaluator`) with
/// a Lighting Strategy (`lighting`). Stateless materials shade per fragment;
/// `Gouraud` caches one color per face at `initialize`.
pub struct MaterialShader {
    material: Option<Material>,
    strategy: LightingStrategy,
    flat_shaded: bool,
    cached_flat_color: Option<Vec3>,
    opacity: f32,
}

impl MaterialShader {
    pub fn for_material(material: &Material, lighting_enabled: bool) -> MaterialShader {
        MaterialShader {
            strategy: strategy_for(material, lighting_enabled),
            flat_shaded: is_flat_shaded(material),
            material: Some(material.clone()),
            cached_flat_color: None,
            opacity: 1.0,
        }
    }

    /// A face with no material at all: flat-colored, unlit.
    pub fn unlit_fallback() -> MaterialShader {
        MaterialShader { material: None, strategy: LightingStrategy::Unlit, flat_shaded: false, cached_flat_color: None, opacity: 1.0 }
    }

    fn shade_surface(&self, surface: &Surface, world: Vec3, normal: Vec3, context: &LightingContext) -> Vec3 {
        let view_dir = (context.camera_position - world).normalize();
        lighting::calculate(self.strategy, world, normal, view_dir, surface, context)
    }

    /// Blends a mirror's reflection buffer into `color` for materials that
    /// carry a `mirror_plane` (§4.G step 3). A no-op unless the material is
    /// reflective, reflections are enabled, and that plane's buffer exists.
    fn apply_reflection(&self, color: Vec3, header: &MaterialHeader, world: Vec3, normal: Vec3, screen_uv: Vec2, context: &LightingContext) -> Vec3 {
        let Some(plane) = header.mirror_plane else { return color };
        if header.reflectivity <= 0.0 {
            return color;
        }
        let Some(reflections) = context.reflections else { return color };
        let key = reflection::quantize_plane(&plane);
        let Some(buffer) = reflections.get(&key) else { return color };

        let sample = reflection::sample_reflection(buffer, screen_uv.x, screen_uv.y, 0);
        let reflected = Vec3::new(sample[0] as f32, sample[1] as f32, sample[2] as f32);

        let mut weight = header.reflectivity.clamp(0.0, 1.0);
        if header.fresnel {
            let view_dir = (context.camera_position - world).normalize();
            let cos_theta = view_dir.dot(normal).max(0.0);
            let schlick = (1.0 - cos_theta).powi(5);
            weight = (weight + (1.0 - weight) * schlick).clamp(0.0, 1.0);
        }
        Vec3::lerp(color, reflected, weight)
    }
}

impl Shader for MaterialShader {
    fn initialize(&mut self, face: &ProjectedFace, context: &LightingContext) {
        self.cached_flat_color = None;
        self.opacity = 1.0;

        let Some(material) = &self.material else {
            self.cached_flat_color = face.flat_color;
            return;
        };

        if !self.flat_shaded {
            return;
        }

        let input = FragmentInput {
            world_position: face.world_center,
            normal: face.normal,
            uv: softraster_math::Vec2::ZERO,
            tangent: softraster_math::Vec4::new(1.0, 0.0, 0.0, 1.0),
            ndc_z: face.depth.avg,
            view_depth: face.depth.avg,
            // Gouraud caches one color for the whole face; there is no
            // single screen position to sample a reflection buffer at, so
            // flat-shaded materials never reflect.
            screen_uv: Vec2::new(0.5, 0.5),
        };
        if let Some(surface) = evaluator::evaluate(material, &input) {
            self.opacity = surface.common().opacity;
            self.cached_flat_color = Some(self.shade_surface(&surface, face.world_center, face.normal, context));
        } else {
            self.cached_flat_color = Some(Vec3::ZERO);
            self.opacity = 0.0;
        }
    }

    fn shade(&mut self, input: &FragmentInput, context: &LightingContext) -> Option<FragmentOutput> {
        if self.flat_shaded {
            let color = self.cached_flat_color?;
            if self.opacity <= 0.0 {
                return None;
            }
            return Some(FragmentOutput { color, depth: Some(input.ndc_z), motion_vector: None });
        }

        let Some(material) = &self.material else {
            let color = self.cached_flat_color.unwrap_or(Vec3::splat(200.0));
            return Some(FragmentOutput { color, depth: Some(input.ndc_z), motion_vector: None });
        };

        let surface = evaluator::evaluate(material, input)?;
        self.opacity = surface.common().opacity;
        let normal = surface.common().normal;
        let color = self.shade_surface(&surface, input.world_position, normal, context);
        let color = self.apply_reflection(color, material.header(), input.world_position, normal, input.screen_uv, context);
        Some(FragmentOutput { color, depth: Some(input.ndc_z), motion_vector: None })
    }

    fn get_opacity(&self) -> f32 {
        self.opacity
    }
}
