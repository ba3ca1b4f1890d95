use softraster_math::Vec3;

use crate::fragment::shader::FragmentInput;
use crate::material::{AlphaMode, Material, PbrParams, PhongParams};
use crate::texture::Texture;

#[derive(Clone, Copy, Debug)]
pub struct SurfaceCommon {
    pub albedo: Vec3,
    pub normal: Vec3,
    pub opacity: f32,
    pub emissive: Vec3,
    pub emissive_intensity: f32,
}

/// Everything a Lighting Strategy needs, independent of which material
/// variant produced it (§4.E).
#[derive(Clone, Copy, Debug)]
pub enum Surface {
    Phong { common: SurfaceCommon, ambient: Vec3, specular: Vec3, shininess: f32 },
    Pbr {
        common: SurfaceCommon,
        roughness: f32,
        metalness: f32,
        f0: f32,
        reflectance: f32,
        ior: f32,
        clearcoat: f32,
        clearcoat_roughness: f32,
        sheen_color: Vec3,
        sheen_roughness: f32,
        transmission: f32,
        thickness: f32,
        attenuation_color: Vec3,
        attenuation_distance: f32,
    },
}

impl Surface {
    pub fn common(&self) -> &SurfaceCommon {
        match self {
            Surface::Phong { common, .. } => common,
            Surface::Pbr { common, .. } => common,
        }
    }
}

/// Samples all maps, applies alpha-mode rules, and reconstructs the
/// tangent-space normal when a normal map is present (§4.E). Returns `None`
/// on MASK discard.
pub fn evaluate(material: &Material, input: &FragmentInput) -> Option<Surface> {
    let header = material.header();
    let base_color = header
        .base_color_map
        .as_ref()
        .map(|tex| tex.sample(input.uv.x, input.uv.y))
        .unwrap_or([255.0, 255.0, 255.0, 255.0]);

    let alpha = (base_color[3] / 255.0) * header.opacity;
    if header.alpha_mode == AlphaMode::Mask && alpha < header.alpha_cutoff {
        return None;
    }
    let opacity = if header.alpha_mode == AlphaMode::Opaque { 1.0 } else { alpha };
    let albedo = Vec3::new(base_color[0], base_color[1], base_color[2]);

    match material {
        Material::Basic(_) | Material::Unlit(_) => {
            let common = SurfaceCommon { albedo, normal: input.normal, opacity, emissive: Vec3::ZERO, emissive_intensity: 0.0 };
            Some(Surface::Phong { common, ambient: Vec3::ZERO, specular: Vec3::ZERO, shininess: 1.0 })
        }

        Material::Phong(_, params) | Material::Gouraud(_, params) => {
            Some(phong_surface(albedo, opacity, input.normal, params))
        }

        Material::Pbr(_, params) => Some(pbr_surface(albedo, opacity, input, params)),
    }
}

fn phong_surface(albedo: Vec3, opacity: f32, normal: Vec3, params: &PhongParams) -> Surface {
    let common = SurfaceCommon {
        albedo: albedo * (params.diffuse * (1.0 / 255.0)),
        normal,
        opacity,
        emissive: Vec3::ZERO,
        emissive_intensity: 0.0,
    };
    Surface::Phong { common, ambient: params.ambient, specular: params.specular, shininess: params.shininess }
}

fn pbr_surface(base_color: Vec3, opacity: f32, input: &FragmentInput, params: &PbrParams) -> Surface {
    let albedo = base_color * (params.albedo * (1.0 / 255.0));

    let (metalness, roughness) = match &params.metallic_roughness_map {
        Some(tex) => {
            let mr = tex.sample(input.uv.x, input.uv.y);
            (mr[2] / 255.0 * params.metalness, mr[1] / 255.0 * params.roughness)
        }
        None => (params.metalness, params.roughness),
    };

    let occlusion = params.occlusion_map.as_ref().map(|tex| tex.sample(input.uv.x, input.uv.y)[0] / 255.0).unwrap_or(1.0);

    let emissive_texel = params.emissive_map.as_ref().map(|tex| tex.sample(input.uv.x, input.uv.y)).unwrap_or([255.0, 255.0, 255.0, 255.0]);
    let emissive = Vec3::new(emissive_texel[0], emissive_texel[1], emissive_texel[2]) * (params.emissive * (1.0 / 255.0));

    let normal = reconstruct_normal(input, &params.normal_map);

    let common = SurfaceCommon { albedo: albedo * occlusion, normal, opacity, emissive, emissive_intensity: params.emissive_intensity };

    Surface::Pbr {
        common,
        roughness: roughness.clamp(0.04, 1.0),
        metalness: metalness.clamp(0.0, 1.0),
        f0: params.f0,
        reflectance: params.reflectance,
        ior: params.ior,
        clearcoat: params.clearcoat,
        clearcoat_roughness: params.clearcoat_roughness,
        sheen_color: params.sheen_color,
        sheen_roughness: params.sheen_roughness,
        transmission: params.transmission,
        thickness: params.thickness,
        attenuation_color: params.attenuation_color,
        attenuation_distance: params.attenuation_distance,
    }
}

/// TBN reconstruction via Gram-Schmidt orthogonalization, with handedness
/// from `tangent.w`; falls back to the geometric normal when the tangent is
/// degenerate (§4.E, §8 scenario 5).
fn reconstruct_normal(input: &FragmentInput, normal_map: &Option<std::sync::Arc<Texture>>) -> Vec3 {
    let Some(tex) = normal_map else {
        return input.normal;
    };
    let t = input.tangent;
    let tangent_vec = Vec3::new(t.x, t.y, t.z);
    if tangent_vec.length_squared() < 1e-8 {
        return input.normal;
    }

    let n = input.normal;
    let tangent = (tangent_vec - n * n.dot(tangent_vec)).normalize();
    if tangent.length_squared() < 1e-8 {
        return input.normal;
    }
    let bitangent = n.cross(tangent) * t.w;

    let sample = tex.sample(input.uv.x, input.uv.y);
    let packed = Vec3::new(sample[0] / 255.0, sample[1] / 255.0, sample[2] / 255.0);
    let tangent_space_normal = packed * 2.0 - Vec3::ONE;

    (tangent * tangent_space_normal.x + bitangent * tangent_space_normal.y + n * tangent_space_normal.z).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::MaterialHeader;
    use softraster_math::Vec2;
    use softraster_math::Vec4;

    fn sample_input() -> FragmentInput {
        FragmentInput {
            world_position: Vec3::ZERO,
            normal: Vec3::UP,
            uv: Vec2::new(0.5, 0.5),
            tangent: Vec4::new(0.0, 0.0, 0.0, 1.0),
            ndc_z: 0.0,
            view_depth: 1.0,
            screen_uv: Vec2::new(0.5, 0.5),
        }
    }

    #[test]
    fn degenerate_tangent_falls_back_to_geometric_normal() {
        let params = crate::material::PbrParams { normal_map: Some(std::sync::Arc::new(Texture::opaque_white())), ..Default::default() };
        let material = Material::Pbr(MaterialHeader::default(), params);
        let input = sample_input();
        let surface = evaluate(&material, &input).unwrap();
        assert_eq!(surface.common().normal, Vec3::UP);
    }

    #[test]
    fn mask_alpha_below_cutoff_discards() {
        let mut header = MaterialHeader::default();
        header.alpha_mode = AlphaMode::Mask;
        header.alpha_cutoff = 0.5;
        header.opacity = 0.1;
        let material = Material::Unlit(header);
        assert!(evaluate(&material, &sample_input()).is_none());
    }
}
