use softraster_math::{Mat4, SphericalHarmonics, Vec3};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContributionKind {
    Ambient,
    Direct,
    Irradiance,
}

/// The result of a light's `computeContribution` (§3). `color` stays in
/// sRGB 0-255 bytes; `intensity` is a linear scalar that already folds in
/// attenuation.
#[derive(Clone, Copy, Debug)]
pub struct Contribution {
    pub kind: ContributionKind,
    pub color: Vec3,
    pub intensity: f32,
    pub direction: Vec3,
}

/// What the lighting strategy needs to know about the point being shaded.
#[derive(Clone, Copy, Debug)]
pub struct SurfacePoint {
    pub position: Vec3,
    pub normal: Option<Vec3>,
}

#[derive(Clone, Debug)]
pub enum LightKind {
    Ambient,
    Directional { direction: Vec3 },
    Point { position: Vec3, range: f32 },
    Spot { position: Vec3, direction: Vec3, angle_rad: f32, range: f32 },
    LightProbe(SphericalHarmonics),
}

#[derive(Clone, Debug)]
pub struct Light {
    pub kind: LightKind,
    /// sRGB 0-255.
    pub color: Vec3,
    pub intensity: f32,
    pub cast_shadow: bool,
    pub world_matrix: Mat4,
}

impl Light {
    pub fn new(kind: LightKind, color: Vec3, intensity: f32) -> Light {
        Light { kind, color, intensity, cast_shadow: false, world_matrix: Mat4::IDENTITY }
    }

    /// Transformed world-space position/direction for variants that carry
    /// one, after applying `world_matrix` (and the config's global world
    /// matrix, already folded into `world_matrix` by the orchestrator).
    pub fn transformed_position(&self) -> Option<Vec3> {
        match &self.kind {
            LightKind::Point { position, .. } => Some(self.world_matrix.transform_point(*position)),
            LightKind::Spot { position, .. } => Some(self.world_matrix.transform_point(*position)),
            _ => None,
        }
    }

    pub fn transformed_direction(&self) -> Option<Vec3> {
        match &self.kind {
            LightKind::Directional { direction } => Some(self.world_matrix.transform_vector3(*direction).normalize()),
            LightKind::Spot { direction, .. } => Some(self.world_matrix.transform_vector3(*direction).normalize()),
            _ => None,
        }
    }

    pub fn compute_contribution(&self, surface: SurfacePoint) -> Option<Contribution> {
        match &self.kind {
            LightKind::Ambient => Some(Contribution {
                kind: ContributionKind::Ambient,
                color: self.color,
                intensity: self.intensity,
                direction: Vec3::UP,
            }),

            LightKind::Directional { .. } => {
                let dir = self.transformed_direction().unwrap_or(Vec3::UP);
                Some(Contribution {
                    kind: ContributionKind::Direct,
                    color: self.color,
                    intensity: self.intensity,
                    direction: -dir,
                })
            }

            LightKind::Point { range, .. } => {
                let light_pos = self.transformed_position().unwrap_or(Vec3::ZERO);
                let to_light = light_pos - surface.position;
                let distance = to_light.length();
                if distance >= *range {
                    return None;
                }
                let direction = if distance > 1e-6 { to_light * (1.0 / distance) } else { Vec3::UP };
                let attenuation = point_attenuation(distance, *range);
                Some(Contribution { kind: ContributionKind::Direct, color: self.color, intensity: self.intensity * attenuation, direction })
            }

            LightKind::Spot { direction, angle_rad, range, .. } => {
                let light_pos = self.transformed_position().unwrap_or(Vec3::ZERO);
                let spot_dir = self.world_matrix.transform_vector3(*direction).normalize();
                let to_light = light_pos - surface.position;
                let distance = to_light.length();
                if distance >= *range {
                    return None;
                }
                let direction_to_light = if distance > 1e-6 { to_light * (1.0 / distance) } else { Vec3::UP };
                let cos_angle = (-direction_to_light).dot(spot_dir);
                let cos_cutoff = angle_rad.cos();
                if cos_angle < cos_cutoff {
                    return None;
                }
                let cone_falloff = ((cos_angle - cos_cutoff) / (1.0 - cos_cutoff).max(1e-6)).clamp(0.0, 1.0);
                let attenuation = point_attenuation(distance, *range) * cone_falloff;
                Some(Contribution { kind: ContributionKind::Direct, color: self.color, intensity: self.intensity * attenuation, direction: direction_to_light })
            }

            LightKind::LightProbe(sh) => {
                let normal = surface.normal?;
                let irradiance = sh.irradiance(normal);
                Some(Contribution { kind: ContributionKind::Irradiance, color: irradiance, intensity: self.intensity, direction: normal })
            }
        }
    }
}

/// Smooth inverse-square falloff that reaches exactly zero at `range`
/// (Epic's windowed attenuation), rather than the source's unbounded
/// `1/d^2` which never naturally yields a "range" boundary.
fn point_attenuation(distance: f32, range: f32) -> f32 {
    if range <= 0.0 {
        return 0.0;
    }
    let window = (1.0 - (distance / range).powi(4)).clamp(0.0, 1.0).powi(2);
    window / (distance * distance + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_light_at_range_is_none() {
        let light = Light::new(LightKind::Point { position: Vec3::ZERO, range: 10.0 }, Vec3::splat(255.0), 1.0);
        let surface = SurfacePoint { position: Vec3::new(10.0, 0.0, 0.0), normal: None };
        assert!(light.compute_contribution(surface).is_none());
    }

    #[test]
    fn point_light_at_zero_distance_falls_back_to_up() {
        let light = Light::new(LightKind::Point { position: Vec3::ZERO, range: 10.0 }, Vec3::splat(255.0), 1.0);
        let surface = SurfacePoint { position: Vec3::ZERO, normal: None };
        let c = light.compute_contribution(surface).unwrap();
        assert_eq!(c.direction, Vec3::UP);
        assert_eq!(c.color, Vec3::splat(255.0));
        assert_eq!(c.intensity, light.intensity);
    }
}
