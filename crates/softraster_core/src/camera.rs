use softraster_math::{Frustum, Mat4, Quaternion, Vec3};

#[derive(Clone, Copy, Debug)]
pub enum Projection {
    Perspective { fov_deg: f32, near: f32, far: f32 },
    Orthographic { half_width: f32, half_height: f32, near: f32, far: f32 },
}

/// A camera plus its cached derived matrices, refreshed once per frame by
/// `update()` (§3: "cached view / projection / view-projection, six frustum
/// planes").
#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Vec3,
    pub orientation: Quaternion,
    pub up: Vec3,
    pub aspect: f32,
    pub projection: Projection,

    view: Mat4,
    proj: Mat4,
    view_projection: Mat4,
    frustum: Frustum,
}

impl Camera {
    pub fn new(position: Vec3, orientation: Quaternion, aspect: f32, projection: Projection) -> Camera {
        let mut camera = Camera {
            position,
            orientation,
            up: Vec3::UP,
            aspect,
            projection,
            view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
            view_projection: Mat4::IDENTITY,
            frustum: Frustum::from_view_projection(&Mat4::IDENTITY),
        };
        camera.update();
        camera
    }

    pub fn forward(&self) -> Vec3 {
        self.orientation.rotate_point(Vec3::new(0.0, 0.0, -1.0))
    }

    pub fn fov_deg(&self) -> Option<f32> {
        match self.projection {
            Projection::Perspective { fov_deg, .. } => Some(fov_deg),
            Projection::Orthographic { .. } => None,
        }
    }

    pub fn near(&self) -> f32 {
        match self.projection {
            Projection::Perspective { near, .. } => near,
            Projection::Orthographic { near, .. } => near,
        }
    }

    pub fn far(&self) -> f32 {
        match self.projection {
            Projection::Perspective { far, .. } => far,
            Projection::Orthographic { far, .. } => far,
        }
    }

    /// Recomputes the view, projection, view-projection, and frustum planes.
    /// Must be called whenever position/orientation/projection change before
    /// any pass consumes the cached matrices (§5 ordering guarantee).
    pub fn update(&mut self) {
        let target = self.position + self.forward();
        self.view = Mat4::look_at(self.position, target, self.up);
        self.proj = match self.projection {
            Projection::Perspective { fov_deg, near, far } => Mat4::perspective(fov_deg, self.aspect, near, far),
            Projection::Orthographic { half_width, half_height, near, far } => Mat4::orthographic(half_width, half_height, near, far),
        };
        self.view_projection = self.proj * self.view;
        self.frustum = Frustum::from_view_projection(&self.view_projection);
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.proj
    }

    pub fn view_projection(&self) -> Mat4 {
        self.view_projection
    }

    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    /// Builds a camera sharing this one's projection/aspect but at a
    /// different position/orientation/view matrix, used by the reflection
    /// subsystem to render from the mirrored viewpoint (§4.G).
    pub fn with_view_override(&self, position: Vec3, view: Mat4, proj: Mat4) -> Camera {
        let view_projection = proj * view;
        Camera {
            position,
            orientation: self.orientation,
            up: self.up,
            aspect: self.aspect,
            projection: self.projection,
            view,
            proj,
            view_projection,
            frustum: Frustum::from_view_projection(&view_projection),
        }
    }
}
