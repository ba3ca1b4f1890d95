pub mod aabb;
pub mod color;
pub mod euler_angles;
pub mod frustum;
pub mod matrix;
pub mod plane;
pub mod quaternion;
pub mod spherical_harmonics;
pub mod utils;
pub mod vector;

pub use aabb::Aabb;
pub use euler_angles::EulerAngles;
pub use frustum::Frustum;
pub use matrix::{Mat3, Mat4};
pub use plane::Plane;
pub use quaternion::Quaternion;
pub use spherical_harmonics::SphericalHarmonics;
pub use vector::{Vec2, Vec3, Vec4};
