use crate::utils::safe_acos;
use crate::vector::Vec3;
use std::ops;

/// Unit quaternion representing an angular displacement.
#[derive(Clone, Copy, Debug)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    pub fn from_axis_angle(axis: Vec3, theta: f32) -> Quaternion {
        let axis = axis.normalize();
        let half = theta * 0.5;
        let s = half.sin();
        Quaternion { x: axis.x * s, y: axis.y * s, z: axis.z * s, w: half.cos() }
    }

    /// Heading (Y), pitch (X), bank (Z) Euler triple -> quaternion, composed
    /// in the same order as the model matrix build in §4.C
    /// (`Ry(heading) * Rx(pitch) * Rz(bank)`).
    pub fn from_euler_zyx(heading: f32, pitch: f32, bank: f32) -> Quaternion {
        let qy = Quaternion::from_axis_angle(Vec3::UP, heading);
        let qx = Quaternion::from_axis_angle(Vec3::new(1.0, 0.0, 0.0), pitch);
        let qz = Quaternion::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), bank);
        qy * qx * qz
    }

    pub fn magnitude(self) -> f32 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn normalize(self) -> Quaternion {
        let mag = self.magnitude();
        if mag > 1e-12 {
            let k = 1.0 / mag;
            Quaternion { x: self.x * k, y: self.y * k, z: self.z * k, w: self.w * k }
        } else {
            Quaternion::IDENTITY
        }
    }

    pub fn conjugate(self) -> Quaternion {
        Quaternion { x: -self.x, y: -self.y, z: -self.z, w: self.w }
    }

    pub fn dot(self, other: Quaternion) -> f32 {
        self.w * other.w + self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn rotation_angle(self) -> f32 {
        safe_acos(self.w) * 2.0
    }

    /// Rotate a point by this quaternion via `q * p * q^-1`.
    pub fn rotate_point(self, p: Vec3) -> Vec3 {
        let q = self;
        let p_quat = Quaternion { x: p.x, y: p.y, z: p.z, w: 0.0 };
        let r = q * p_quat * q.conjugate();
        Vec3::new(r.x, r.y, r.z)
    }

    pub fn slerp(a: Quaternion, b: Quaternion, t: f32) -> Quaternion {
        if t <= 0.0 {
            return a;
        }
        if t >= 1.0 {
            return b;
        }

        let mut cos_omega = a.dot(b);
        let mut b = b;
        if cos_omega < 0.0 {
            b = Quaternion { x: -b.x, y: -b.y, z: -b.z, w: -b.w };
            cos_omega = -cos_omega;
        }

        let (k0, k1) = if cos_omega > 0.9999 {
            (1.0 - t, t)
        } else {
            let sin_omega = (1.0 - cos_omega * cos_omega).sqrt();
            let omega = sin_omega.atan2(cos_omega);
            let inv_sin = 1.0 / sin_omega;
            (((1.0 - t) * omega).sin() * inv_sin, (t * omega).sin() * inv_sin)
        };

        Quaternion {
            x: k0 * a.x + k1 * b.x,
            y: k0 * a.y + k1 * b.y,
            z: k0 * a.z + k1 * b.z,
            w: k0 * a.w + k1 * b.w,
        }
    }
}

impl ops::Mul<Quaternion> for Quaternion {
    type Output = Quaternion;
    fn mul(self, a: Quaternion) -> Quaternion {
        Quaternion {
            w: self.w * a.w - self.x * a.x - self.y * a.y - self.z * a.z,
            x: self.w * a.x + self.x * a.w + self.y * a.z - self.z * a.y,
            y: self.w * a.y - self.x * a.z + self.y * a.w + self.z * a.x,
            z: self.w * a.z + self.x * a.y - self.y * a.x + self.z * a.w,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Mat4;

    #[test]
    fn euler_roundtrip_matches_matrix_rotation_within_tolerance() {
        let (h, p, b) = (0.4_f32, -0.2_f32, 0.7_f32);
        let q = Quaternion::from_euler_zyx(h, p, b);
        let from_quat = Mat4::from_quaternion(q);
        let from_euler = Mat4::rotation_y(h) * Mat4::rotation_x(p) * Mat4::rotation_z(b);
        for i in 0..3 {
            for j in 0..3 {
                assert!((from_quat.m[i][j] - from_euler.m[i][j]).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn identity_quaternion_leaves_point_unchanged() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        let r = Quaternion::IDENTITY.rotate_point(p);
        assert!((r - p).length() < 1e-6);
    }
}
