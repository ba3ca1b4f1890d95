use crate::vector::Vec3;

/// 2nd-order (9-coefficient) spherical harmonics, one triple per color
/// channel, representing incoming radiance for ambient/probe lighting (§4.A).
#[derive(Clone, Copy, Debug, Default)]
pub struct SphericalHarmonics {
    pub coefficients: [Vec3; 9],
}

const Y00: f32 = 0.282095;
const Y1: f32 = 0.488603;
const Y2: f32 = 1.092548;
const Y20: f32 = 0.315392;
const Y22: f32 = 0.546274;

// Cosine-lobe convolution constants (Ramamoorthi & Hanrahan).
const C1: f32 = 0.429043;
const C2: f32 = 0.511664;
const C3: f32 = 0.743125;
const C4: f32 = 0.886227;
const C5: f32 = 0.247708;

impl SphericalHarmonics {
    pub const ZERO: SphericalHarmonics = SphericalHarmonics { coefficients: [Vec3::ZERO; 9] };

    /// Projects a single directional sample of radiance onto the SH basis
    /// and accumulates it, weighted by the solid angle the sample covers.
    pub fn accumulate_sample(&mut self, direction: Vec3, radiance: Vec3, weight: f32) {
        let d = direction.normalize();
        let basis = [
            Y00,
            Y1 * d.y,
            Y1 * d.z,
            Y1 * d.x,
            Y2 * d.x * d.y,
            Y2 * d.y * d.z,
            Y20 * (3.0 * d.z * d.z - 1.0),
            Y2 * d.x * d.z,
            Y22 * (d.x * d.x - d.y * d.y),
        ];
        for i in 0..9 {
            self.coefficients[i] = self.coefficients[i] + radiance * (basis[i] * weight);
        }
    }

    /// Reconstructs irradiance (not radiance) arriving at a surface with
    /// the given normal, via the analytic cosine-lobe convolution.
    pub fn irradiance(&self, normal: Vec3) -> Vec3 {
        let n = normal.normalize();
        let l = &self.coefficients;
        l[6] * (C3 * n.z * n.z - C5)
            + l[0] * C4
            + (l[4] * (n.x * n.y) + l[7] * (n.x * n.z) + l[5] * (n.y * n.z)) * (2.0 * C1)
            + l[8] * (C1 * (n.x * n.x - n.y * n.y))
            + (l[3] * n.x + l[1] * n.y + l[2] * n.z) * (2.0 * C2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dc_term_alone_reconstructs_uniform_irradiance_times_pi() {
        let r = 100.0;
        let mut sh = SphericalHarmonics::ZERO;
        sh.coefficients[0] = Vec3::new(r / Y00, 0.0, 0.0);
        let irradiance = sh.irradiance(Vec3::UP);
        assert!((irradiance.x - r * std::f32::consts::PI).abs() < 1.0);
    }
}
