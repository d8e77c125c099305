//! Camera
//!
//! Perspective look-at camera supplying the view, projection and
//! rotation-only view used by the skybox pass.

use glam::{Mat3, Mat4, Vec3};

/// Perspective look-at camera.
///
/// Matrices are right-handed with `[0, 1]` depth (`perspective_rh`).
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// `fov` is the vertical field of view in degrees.
    #[must_use]
    pub fn new_perspective(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 4.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: fov.to_radians(),
            aspect,
            near,
            far,
        }
    }

    #[must_use]
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub fn looking_at(mut self, target: Vec3) -> Self {
        self.target = target;
        self
    }

    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    #[must_use]
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// View matrix with the translation stripped, for the skybox.
    #[must_use]
    pub fn rotation_only_view(&self) -> Mat4 {
        Mat4::from_mat3(Mat3::from_mat4(self.view_matrix()))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new_perspective(80.0, 1.0, 0.1, 100.0)
    }
}
