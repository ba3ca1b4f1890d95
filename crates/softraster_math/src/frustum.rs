use crate::matrix::Mat4;
use crate::plane::Plane;
use crate::vector::{Vec3, Vec4};

/// The six bounding planes of a view frustum, normals pointing inward.
#[derive(Clone, Copy, Debug)]
pub struct Frustum {
    pub planes: [Plane; 6],
}

pub const LEFT: usize = 0;
pub const RIGHT: usize = 1;
pub const BOTTOM: usize = 2;
pub const TOP: usize = 3;
pub const NEAR: usize = 4;
pub const FAR: usize = 5;

impl Frustum {
    /// Extracts the six planes by adding/subtracting rows of the
    /// view-projection matrix (Gribb-Hartmann), then normalizing (§4.A).
    pub fn from_view_projection(vp: &Mat4) -> Frustum {
        let r0 = vp.row(0);
        let r1 = vp.row(1);
        let r2 = vp.row(2);
        let r3 = vp.row(3);

        let raw = [
            r3 + r0, // left
            r3 - r0, // right
            r3 + r1, // bottom
            r3 - r1, // top
            r3 + r2, // near
            r3 - r2, // far
        ];

        let planes = raw.map(plane_from_row).map(|p| p.normalized());
        Frustum { planes }
    }

    /// Returns true if the point is outside (behind) at least one plane.
    pub fn point_is_outside(&self, p: Vec3) -> bool {
        self.planes.iter().any(|plane| plane.distance(p) < 0.0)
    }

    pub fn sphere_is_outside(&self, center: Vec3, radius: f32) -> bool {
        self.planes.iter().any(|plane| plane.distance(center) < -radius)
    }

    /// AABB-vs-frustum test via the clip-code trick used in the shadow
    /// subsystem's culling step (§4.F step 3): trivially reject when one
    /// plane excludes all eight corners.
    pub fn aabb_is_outside(&self, min: Vec3, max: Vec3) -> bool {
        for plane in &self.planes {
            let mut all_outside = true;
            for i in 0..8 {
                let corner = Vec3::new(
                    if i & 1 == 0 { min.x } else { max.x },
                    if i & 2 == 0 { min.y } else { max.y },
                    if i & 4 == 0 { min.z } else { max.z },
                );
                if plane.distance(corner) >= 0.0 {
                    all_outside = false;
                    break;
                }
            }
            if all_outside {
                return true;
            }
        }
        false
    }
}

fn plane_from_row(row: Vec4) -> Plane {
    Plane::new(Vec3::new(row.x, row.y, row.z), row.w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Mat4;

    #[test]
    fn point_at_camera_center_is_inside() {
        let proj = Mat4::perspective(60.0, 1.0, 0.1, 100.0);
        let view = Mat4::look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::UP);
        let frustum = Frustum::from_view_projection(&(proj * view));
        assert!(!frustum.point_is_outside(Vec3::ZERO));
    }

    #[test]
    fn point_far_behind_camera_is_outside() {
        let proj = Mat4::perspective(60.0, 1.0, 0.1, 100.0);
        let view = Mat4::look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::UP);
        let frustum = Frustum::from_view_projection(&(proj * view));
        assert!(frustum.point_is_outside(Vec3::new(0.0, 0.0, 500.0)));
    }
}
