use crate::matrix::Mat4;
use crate::vector::Vec3;

/// An axis-aligned bounding box, used for mesh bounds and shadow-frustum
/// fitting (§4.F).
#[derive(Clone, Copy, Debug)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub const EMPTY: Aabb = Aabb {
        min: Vec3 { x: f32::MAX, y: f32::MAX, z: f32::MAX },
        max: Vec3 { x: f32::MIN, y: f32::MIN, z: f32::MIN },
    };

    pub fn from_points(points: &[Vec3]) -> Aabb {
        let mut b = Aabb::EMPTY;
        for &p in points {
            b.add_point(p);
        }
        b
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn add_point(&mut self, p: Vec3) {
        self.min = Vec3::new(self.min.x.min(p.x), self.min.y.min(p.y), self.min.z.min(p.z));
        self.max = Vec3::new(self.max.x.max(p.x), self.max.y.max(p.y), self.max.z.max(p.z));
    }

    pub fn add_aabb(&mut self, other: &Aabb) {
        self.add_point(other.min);
        self.add_point(other.max);
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// The 8 corner points, bit 0/1/2 selecting max.x/max.y/max.z respectively.
    pub fn corner(&self, i: usize) -> Vec3 {
        Vec3::new(
            if i & 1 != 0 { self.max.x } else { self.min.x },
            if i & 2 != 0 { self.max.y } else { self.min.y },
            if i & 4 != 0 { self.max.z } else { self.min.z },
        )
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x
            && p.y >= self.min.y && p.y <= self.max.y
            && p.z >= self.min.z && p.z <= self.max.z
    }

    pub fn closest_point_to(&self, p: Vec3) -> Vec3 {
        Vec3::new(p.x.clamp(self.min.x, self.max.x), p.y.clamp(self.min.y, self.max.y), p.z.clamp(self.min.z, self.max.z))
    }

    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        (self.closest_point_to(center) - center).length_squared() <= radius * radius
    }

    /// Bounding box of `self` transformed by `m`, computed by transforming
    /// all 8 corners (conservative, but simple and correct for any `m`).
    pub fn transformed(&self, m: &Mat4) -> Aabb {
        let mut out = Aabb::EMPTY;
        for i in 0..8 {
            out.add_point(m.transform_point(self.corner(i)));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_points_produces_tight_bounds() {
        let b = Aabb::from_points(&[Vec3::new(-1.0, 0.0, 2.0), Vec3::new(3.0, 5.0, -2.0)]);
        assert_eq!(b.min, Vec3::new(-1.0, 0.0, -2.0));
        assert_eq!(b.max, Vec3::new(3.0, 5.0, 2.0));
    }

    #[test]
    fn sphere_touching_corner_intersects() {
        let b = Aabb::from_points(&[Vec3::ZERO, Vec3::new(1.0, 1.0, 1.0)]);
        assert!(b.intersects_sphere(Vec3::new(2.0, 2.0, 2.0), 2.0));
        assert!(!b.intersects_sphere(Vec3::new(10.0, 10.0, 10.0), 1.0));
    }
}
