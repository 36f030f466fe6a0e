use glam::{Affine3A, Mat4};

/// Perspective camera component.
///
/// Starts with a projection built from fov/aspect/near/far. Once the
/// detector is calibrated its projection replaces the computed one through
/// [`Camera::set_projection_matrix`], and resizes no longer touch it.
#[derive(Debug, Clone)]
pub struct Camera {
    pub name: String,

    /// Vertical field of view, radians.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,

    calibrated: bool,

    pub(crate) world_matrix: Affine3A,
    pub(crate) view_matrix: Mat4,
    pub(crate) projection_matrix: Mat4,
    pub(crate) view_projection_matrix: Mat4,
}

impl Camera {
    /// `fov` is given in degrees.
    #[must_use]
    pub fn new_perspective(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut cam = Self {
            name: "Camera".to_string(),
            fov: fov.to_radians(),
            aspect,
            near,
            far,
            calibrated: false,
            world_matrix: Affine3A::IDENTITY,
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            view_projection_matrix: Mat4::IDENTITY,
        };
        cam.update_projection_matrix();
        cam
    }

    pub fn update_projection_matrix(&mut self) {
        if !self.calibrated {
            self.projection_matrix = Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far);
        }
        self.view_projection_matrix = self.projection_matrix * self.view_matrix;
    }

    /// Adopts an externally supplied projection (the detector's calibration).
    pub fn set_projection_matrix(&mut self, projection: Mat4) {
        self.projection_matrix = projection;
        self.calibrated = true;
        self.view_projection_matrix = self.projection_matrix * self.view_matrix;
    }

    /// Updates the aspect ratio. Calibrated projections are left alone.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.update_projection_matrix();
    }

    pub fn update_view_projection(&mut self, world_transform: &Affine3A) {
        self.world_matrix = *world_transform;
        self.view_matrix = Mat4::from(*world_transform).inverse();
        self.view_projection_matrix = self.projection_matrix * self.view_matrix;
    }

    #[inline]
    #[must_use]
    pub fn is_calibrated(&self) -> bool {
        self.calibrated
    }

    #[inline]
    #[must_use]
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    #[inline]
    #[must_use]
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    #[inline]
    #[must_use]
    pub fn view_projection_matrix(&self) -> &Mat4 {
        &self.view_projection_matrix
    }
}
