use std::f32::consts::PI;

use softraster_math::{color, SphericalHarmonics, Vec3};

use crate::fragment::evaluator::Surface;
use crate::fragment::shader::LightingContext;
use crate::light::{ContributionKind, SurfacePoint};

/// Which lighting interface a face's material routes through (§4.E). Chosen
/// once per material at `Shader::initialize`, never re-decided per
/// fragment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightingStrategy {
    Unlit,
    BlinnPhong,
    Pbr,
}

/// `calculate(world, normal, viewDir, surface, context) -> RGB`, linear
/// space scaled to 0-255 (§4.E).
pub fn calculate(strategy: LightingStrategy, world: Vec3, normal: Vec3, view_dir: Vec3, surface: &Surface, context: &LightingContext) -> Vec3 {
    match strategy {
        LightingStrategy::Unlit => surface.common().albedo,
        LightingStrategy::BlinnPhong => calculate_blinn_phong(world, normal, view_dir, surface, context),
        LightingStrategy::Pbr => calculate_pbr(world, normal, view_dir, surface, context),
    }
}

fn decode_light_linear(color: Vec3) -> Vec3 {
    Vec3::new(
        color::srgb_to_linear(color.x / 255.0),
        color::srgb_to_linear(color.y / 255.0),
        color::srgb_to_linear(color.z / 255.0),
    )
}

fn sh_is_zero(sh: &SphericalHarmonics) -> bool {
    sh.coefficients.iter().all(|c| c.length_squared() < 1e-12)
}

/// Ambient irradiance in `[0,1]` linear terms: SH reconstruction when
/// enabled and non-empty (no ambient loss when SH is all-zero, §8), else the
/// scene's accumulated `Ambient`-kind contributions.
fn ambient_term(normal: Vec3, accumulated_ambient: Vec3, context: &LightingContext) -> Vec3 {
    if context.sh_enabled && !sh_is_zero(&context.sh_coefficients) {
        (context.sh_coefficients.irradiance(normal) / 255.0).max(Vec3::ZERO)
    } else {
        accumulated_ambient
    }
}

fn calculate_blinn_phong(world: Vec3, normal: Vec3, view_dir: Vec3, surface: &Surface, context: &LightingContext) -> Vec3 {
    let Surface::Phong { common, specular, shininess, .. } = surface else {
        return surface.common().albedo;
    };
    let albedo = common.albedo * (1.0 / 255.0);
    let specular_color = *specular * (1.0 / 255.0);

    let mut accumulated_ambient = Vec3::ZERO;
    let mut direct = Vec3::ZERO;

    for (light_index, light) in context.lights.iter().enumerate() {
        let Some(contribution) = light.compute_contribution(SurfacePoint { position: world, normal: Some(normal) }) else {
            continue;
        };
        match contribution.kind {
            ContributionKind::Ambient => {
                accumulated_ambient += decode_light_linear(contribution.color) * contribution.intensity;
            }
            ContributionKind::Irradiance => {
                accumulated_ambient += (contribution.color / 255.0) * contribution.intensity;
            }
            ContributionKind::Direct => {
                let n_dot_l = normal.dot(contribution.direction).max(0.0);
                if n_dot_l <= 0.0 {
                    continue;
                }
                let light_linear = decode_light_linear(contribution.color) * contribution.intensity;
                let shadow = context.shadow_factor_for(light_index, world, normal) * (1.0 / 255.0);

                let half_vector = (view_dir + contribution.direction).normalize();
                let spec_strength = normal.dot(half_vector).max(0.0).powf(shininess.max(1.0));

                let diffuse = albedo * light_linear * n_dot_l;
                let specular_term = specular_color * light_linear * spec_strength;
                direct += (diffuse + specular_term) * shadow;
            }
        }
    }

    let ambient = ambient_term(normal, accumulated_ambient, context);
    let linear = albedo * ambient + direct;
    clamp_to_byte_range(linear)
}

fn clamp_to_byte_range(linear: Vec3) -> Vec3 {
    Vec3::new(linear.x.clamp(0.0, 1.0), linear.y.clamp(0.0, 1.0), linear.z.clamp(0.0, 1.0)) * 255.0
}

// --- PBR (Cook-Torrance) ---------------------------------------------------

fn ggx_distribution(n_dot_h: f32, roughness: f32) -> f32 {
    let alpha = roughness * roughness;
    let alpha2 = alpha * alpha;
    let denom = n_dot_h * n_dot_h * (alpha2 - 1.0) + 1.0;
    alpha2 / (PI * denom * denom).max(1e-8)
}

fn smith_schlick_g(n_dot_v: f32, n_dot_l: f32, roughness: f32) -> f32 {
    let k = (roughness + 1.0).powi(2) / 8.0;
    let g1 = |x: f32| x / (x * (1.0 - k) + k).max(1e-8);
    g1(n_dot_v) * g1(n_dot_l)
}

fn schlick_fresnel(cos_theta: f32, f0: Vec3) -> Vec3 {
    f0 + (Vec3::ONE - f0) * (1.0 - cos_theta).clamp(0.0, 1.0).powi(5)
}

/// Charlie sheen distribution.
fn charlie_distribution(n_dot_h: f32, roughness: f32) -> f32 {
    let alpha = roughness.max(1e-3);
    let inv_alpha = 1.0 / alpha;
    let cos2h = n_dot_h * n_dot_h;
    let sin2h = (1.0 - cos2h).max(1e-8);
    (2.0 + inv_alpha) * sin2h.powf(inv_alpha * 0.5) / (2.0 * PI)
}

/// Ashikhmin sheen visibility term.
fn ashikhmin_visibility(n_dot_v: f32, n_dot_l: f32) -> f32 {
    1.0 / (4.0 * (n_dot_l + n_dot_v - n_dot_l * n_dot_v)).max(1e-4)
}

fn calculate_pbr(world: Vec3, normal: Vec3, view_dir: Vec3, surface: &Surface, context: &LightingContext) -> Vec3 {
    let Surface::Pbr {
        common,
        roughness,
        metalness,
        f0,
        clearcoat,
        clearcoat_roughness,
        sheen_color,
        sheen_roughness,
        transmission,
        thickness,
        attenuation_color,
        attenuation_distance,
        ..
    } = surface
    else {
        return surface.common().albedo;
    };

    let albedo = common.albedo * (1.0 / 255.0);
    let base_f0 = Vec3::splat(*f0).lerp_to(albedo, *metalness);
    let n_dot_v = normal.dot(view_dir).max(1e-4);

    let mut direct = Vec3::ZERO;
    let mut accumulated_ambient = Vec3::ZERO;

    for (light_index, light) in context.lights.iter().enumerate() {
        let Some(contribution) = light.compute_contribution(SurfacePoint { position: world, normal: Some(normal) }) else {
            continue;
        };
        match contribution.kind {
            ContributionKind::Ambient => accumulated_ambient += decode_light_linear(contribution.color) * contribution.intensity,
            ContributionKind::Irradiance => accumulated_ambient += (contribution.color / 255.0) * contribution.intensity,
            ContributionKind::Direct => {
                let n_dot_l = normal.dot(contribution.direction).max(0.0);
                if n_dot_l <= 0.0 {
                    continue;
                }
                let light_linear = decode_light_linear(contribution.color) * contribution.intensity;
                let shadow = context.shadow_factor_for(light_index, world, normal) * (1.0 / 255.0);

                let half_vector = (view_dir + contribution.direction).normalize();
                let n_dot_h = normal.dot(half_vector).max(0.0);
                let v_dot_h = view_dir.dot(half_vector).max(0.0);

                let d = ggx_distribution(n_dot_h, *roughness);
                let g = smith_schlick_g(n_dot_v, n_dot_l, *roughness);
                let f = schlick_fresnel(v_dot_h, base_f0);

                let specular = f * (d * g / (4.0 * n_dot_v * n_dot_l).max(1e-4));
                let kd = (Vec3::ONE - f) * (1.0 - metalness);
                let mut diffuse = kd * albedo * (1.0 / PI);

                if *transmission > 0.0 {
                    diffuse *= 1.0 - transmission;
                }

                let mut clearcoat_term = Vec3::ZERO;
                if *clearcoat > 0.0 {
                    let cc_alpha = clearcoat_roughness * clearcoat_roughness;
                    let cc_k = cc_alpha * cc_alpha / 2.0;
                    let cc_d = ggx_distribution(n_dot_h, *clearcoat_roughness);
                    let cc_g = {
                        let g1 = |x: f32| x / (x * (1.0 - cc_k) + cc_k).max(1e-8);
                        g1(n_dot_v) * g1(n_dot_l)
                    };
                    let cc_f = schlick_fresnel(v_dot_h, Vec3::splat(0.04)).x;
                    clearcoat_term = Vec3::splat(cc_f * cc_d * cc_g / (4.0 * n_dot_v * n_dot_l).max(1e-4)) * *clearcoat;
                }

                let mut sheen_term = Vec3::ZERO;
                if sheen_color.length_squared() > 0.0 {
                    let sheen_d = charlie_distribution(n_dot_h, *sheen_roughness);
                    let sheen_v = ashikhmin_visibility(n_dot_v, n_dot_l);
                    sheen_term = *sheen_color * (1.0 / 255.0) * (sheen_d * sheen_v);
                }

                direct += (diffuse + specular + clearcoat_term + sheen_term) * light_linear * n_dot_l * shadow;
            }
        }
    }

    let ambient = ambient_term(normal, accumulated_ambient, context);
    let fresnel_ambient = schlick_fresnel(n_dot_v, base_f0);
    let ambient_diffuse = albedo * ambient * (Vec3::ONE - fresnel_ambient) * (1.0 - metalness);
    let ambient_specular = ambient * fresnel_ambient;

    let mut linear = ambient_diffuse + ambient_specular + direct + common.emissive * common.emissive_intensity;

    if *transmission > 0.0 && *attenuation_distance > 0.0 {
        let absorb = Vec3::new(
            -attenuation_color.x.max(1e-4).ln() / attenuation_distance,
            -attenuation_color.y.max(1e-4).ln() / attenuation_distance,
            -attenuation_color.z.max(1e-4).ln() / attenuation_distance,
        );
        let transmitted = albedo * Vec3::new((-absorb.x * thickness).exp(), (-absorb.y * thickness).exp(), (-absorb.z * thickness).exp());
        linear += transmitted * *transmission;
    }

    let tonemapped = Vec3::new(color::aces_tonemap(linear.x), color::aces_tonemap(linear.y), color::aces_tonemap(linear.z));
    tonemapped * 255.0
}

trait LerpTo {
    fn lerp_to(self, target: Vec3, t: f32) -> Vec3;
}

impl LerpTo for Vec3 {
    fn lerp_to(self, target: Vec3, t: f32) -> Vec3 {
        Vec3::lerp(self, target, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::evaluator::SurfaceCommon;
    use softraster_math::SphericalHarmonics;

    fn empty_context() -> LightingContext<'static> {
        LightingContext {
            camera_position: Vec3::ZERO,
            lights: &[],
            shadows_enabled: false,
            lighting_enabled: true,
            sh_enabled: true,
            sh_coefficients: SphericalHarmonics::ZERO,
            gamma: 2.2,
            world_matrix: softraster_math::Mat4::IDENTITY,
            shadow_factor: None,
            reflections: None,
        }
    }

    #[test]
    fn sh_gate_with_zero_coefficients_matches_sh_disabled() {
        let surface = Surface::Phong {
            common: SurfaceCommon { albedo: Vec3::splat(200.0), normal: Vec3::UP, opacity: 1.0, emissive: Vec3::ZERO, emissive_intensity: 0.0 },
            ambient: Vec3::ZERO,
            specular: Vec3::ZERO,
            shininess: 32.0,
        };
        let mut enabled = empty_context();
        enabled.sh_enabled = true;
        let mut disabled = empty_context();
        disabled.sh_enabled = false;

        let with_sh = calculate(LightingStrategy::BlinnPhong, Vec3::ZERO, Vec3::UP, Vec3::UP, &surface, &enabled);
        let without_sh = calculate(LightingStrategy::BlinnPhong, Vec3::ZERO, Vec3::UP, Vec3::UP, &surface, &disabled);
        assert_eq!(with_sh, without_sh);
    }

    #[test]
    fn unlit_strategy_returns_albedo_unchanged() {
        let surface = Surface::Phong {
            common: SurfaceCommon { albedo: Vec3::new(10.0, 20.0, 30.0), normal: Vec3::UP, opacity: 1.0, emissive: Vec3::ZERO, emissive_intensity: 0.0 },
            ambient: Vec3::ZERO,
            specular: Vec3::ZERO,
            shininess: 1.0,
        };
        let context = empty_context();
        let result = calculate(LightingStrategy::Unlit, Vec3::ZERO, Vec3::UP, Vec3::UP, &surface, &context);
        assert_eq!(result, Vec3::new(10.0, 20.0, 30.0));
    }
}
