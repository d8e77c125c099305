//! Shadow Utilities
//!
//! Pure math for shadow mapping, kept apart from the pass driver for reuse
//! and testability.
//!
//! - Perspective VP matrix for spot light shadows
//! - Six 90° cube-face VP matrices for point light shadows

use glam::{Mat4, Vec3};

use crate::resources::gpu::CubeFace;

/// Above this `|direction.y|` the spot view uses `+Z` as up.
const VERTICAL_THRESHOLD: f32 = 0.99;

// ============================================================================
// Spot Light VP Matrix
// ============================================================================

/// Builds the light-space matrix of a spot light.
///
/// `fov` is the full cone angle in radians. A zero-length direction falls
/// back to straight down.
#[must_use]
pub fn build_spot_vp(position: Vec3, direction: Vec3, fov: f32, near: f32, far: f32) -> Mat4 {
    let safe_dir = if direction.length_squared() > 1e-6 {
        direction.normalize()
    } else {
        Vec3::NEG_Y
    };
    let up = if safe_dir.y.abs() > VERTICAL_THRESHOLD {
        Vec3::Z
    } else {
        Vec3::Y
    };
    let view = Mat4::look_at_rh(position, position + safe_dir, up);
    let proj = Mat4::perspective_rh(fov, 1.0, near, far);
    proj * view
}

// ============================================================================
// Point Light Cube Faces
// ============================================================================

/// View matrix looking from `position` through `face`.
#[must_use]
pub fn cube_face_view(position: Vec3, face: CubeFace) -> Mat4 {
    Mat4::look_at_rh(position, position + face.direction(), face.up())
}

/// 90° aspect-1 projection shared by all six faces.
#[must_use]
pub fn cube_face_projection(near: f32, far: f32) -> Mat4 {
    Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, near, far)
}

/// View-projection matrices for the six faces, in [`CubeFace`] order.
#[must_use]
pub fn build_point_face_vps(position: Vec3, near: f32, far: f32) -> [Mat4; 6] {
    let proj = cube_face_projection(near, far);
    CubeFace::ALL.map(|face| proj * cube_face_view(position, face))
}
