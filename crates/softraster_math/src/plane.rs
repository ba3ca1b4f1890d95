use crate::vector::Vec3;

/// A plane `n . p + d = 0`. `distance(p)` is the signed point-to-plane
/// distance along `n`.
#[derive(Clone, Copy, Debug)]
pub struct Plane {
    pub normal: Vec3,
    pub d: f32,
}

impl Plane {
    pub fn new(normal: Vec3, d: f32) -> Plane {
        Plane { normal, d }
    }

    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Plane {
        let normal = normal.normalize();
        Plane { normal, d: -normal.dot(point) }
    }

    pub fn distance(&self, p: Vec3) -> f32 {
        self.normal.dot(p) + self.d
    }

    pub fn normalized(&self) -> Plane {
        let len = self.normal.length();
        if len > 1e-12 {
            Plane { normal: self.normal * (1.0 / len), d: self.d / len }
        } else {
            *self
        }
    }

    /// Reflects a point across this plane.
    pub fn reflect_point(&self, p: Vec3) -> Vec3 {
        p - self.normal * (2.0 * self.distance(p))
    }

    /// `R = I - 2 n n^T`, with a translation column of `-2 d n`, as a 4x4
    /// matrix in the reflection subsystem's column-vector convention.
    pub fn reflection_matrix(&self) -> crate::matrix::Mat4 {
        let n = self.normal;
        let m = [
            [1.0 - 2.0 * n.x * n.x, -2.0 * n.x * n.y, -2.0 * n.x * n.z, -2.0 * self.d * n.x],
            [-2.0 * n.x * n.y, 1.0 - 2.0 * n.y * n.y, -2.0 * n.y * n.z, -2.0 * self.d * n.y],
            [-2.0 * n.x * n.z, -2.0 * n.y * n.z, 1.0 - 2.0 * n.z * n.z, -2.0 * self.d * n.z],
            [0.0, 0.0, 0.0, 1.0],
        ];
        crate::matrix::Mat4::from_rows(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflecting_twice_returns_the_original_point() {
        let plane = Plane::from_point_normal(Vec3::new(0.0, 2.0, 0.0), Vec3::UP);
        let p = Vec3::new(1.0, 5.0, 3.0);
        let once = plane.reflect_point(p);
        let twice = plane.reflect_point(once);
        assert!((twice - p).length() < 1e-5);
    }

    #[test]
    fn point_on_plane_has_zero_distance() {
        let plane = Plane::from_point_normal(Vec3::ZERO, Vec3::UP);
        assert!(plane.distance(Vec3::new(3.0, 0.0, -2.0)).abs() < 1e-6);
    }
}
