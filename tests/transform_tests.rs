//! Transform and Camera tests
//!
//! Tests for:
//! - Transform TRS composition and matrix decomposition
//! - Euler rotation builder
//! - Camera view/projection conventions
//! - Rotation-only skybox view

use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Quat, Vec3, Vec4};
use tidelight::scene::camera::Camera;
use tidelight::scene::transform::Transform;

// ============================================================================
// Helper
// ============================================================================

const EPSILON: f32 = 1e-5;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
}

// ============================================================================
// Transform
// ============================================================================

#[test]
fn transform_default_is_identity() {
    let t = Transform::default();
    assert_eq!(t.position, Vec3::ZERO);
    assert_eq!(t.rotation, Quat::IDENTITY);
    assert_eq!(t.scale, Vec3::ONE);
}

#[test]
fn transform_applies_scale_rotation_translation_in_order() {
    let t = Transform {
        position: Vec3::new(1.0, 0.0, 0.0),
        rotation: Quat::from_rotation_z(FRAC_PI_2),
        scale: Vec3::splat(2.0),
    };
    // (1,0,0) -> scale (2,0,0) -> rotate (0,2,0) -> translate (1,2,0)
    let p = t.to_affine().transform_point3(Vec3::X);
    assert!(vec3_approx(p, Vec3::new(1.0, 2.0, 0.0)), "{p}");
}

#[test]
fn transform_from_matrix_round_trip() {
    let original = Transform::from_translation(Vec3::new(3.0, -1.0, 2.0))
        .with_rotation_euler(0.3, 0.2, 0.1)
        .with_scale(Vec3::new(1.0, 2.0, 3.0));
    let matrix = Mat4::from(original.to_affine());
    let decomposed = Transform::from_matrix(matrix);

    assert!(vec3_approx(decomposed.position, original.position));
    assert!(vec3_approx(decomposed.scale, original.scale));
    assert!(decomposed.rotation.abs_diff_eq(original.rotation, EPSILON)
        || decomposed.rotation.abs_diff_eq(-original.rotation, EPSILON));
}

#[test]
fn euler_builder_rotates_about_x() {
    let t = Transform::default().with_rotation_euler(FRAC_PI_2, 0.0, 0.0);
    let p = t.to_affine().transform_vector3(Vec3::Y);
    assert!(vec3_approx(p, Vec3::Z), "{p}");
}

// ============================================================================
// Camera
// ============================================================================

#[test]
fn camera_fov_is_given_in_degrees() {
    let camera = Camera::new_perspective(90.0, 1.5, 0.1, 50.0);
    assert!(approx_eq(camera.fov, FRAC_PI_2));
    assert!(approx_eq(camera.aspect, 1.5));
}

#[test]
fn camera_target_projects_to_screen_center() {
    let camera = Camera::default()
        .with_position(Vec3::new(4.0, 3.0, 5.0))
        .looking_at(Vec3::new(0.0, 1.0, 0.0));
    let clip = camera.view_projection_matrix() * Vec4::new(0.0, 1.0, 0.0, 1.0);
    let ndc = clip.truncate() / clip.w;
    assert!(approx_eq(ndc.x, 0.0) && approx_eq(ndc.y, 0.0));
    assert!(ndc.z > 0.0 && ndc.z < 1.0, "depth range is [0, 1]: {}", ndc.z);
}

#[test]
fn camera_near_and_far_map_to_depth_bounds() {
    let camera = Camera::new_perspective(60.0, 1.0, 0.5, 20.0).with_position(Vec3::ZERO);
    let camera = Camera {
        target: Vec3::NEG_Z,
        ..camera
    };
    let vp = camera.view_projection_matrix();
    let near = vp * Vec4::new(0.0, 0.0, -0.5, 1.0);
    let far = vp * Vec4::new(0.0, 0.0, -20.0, 1.0);
    assert!(approx_eq(near.z / near.w, 0.0));
    assert!((far.z / far.w - 1.0).abs() < 1e-4);
}

#[test]
fn rotation_only_view_ignores_position() {
    let a = Camera::default().with_position(Vec3::new(0.0, 0.0, 4.0));
    let b = Camera {
        target: Vec3::new(10.0, 0.0, -4.0),
        ..Camera::default().with_position(Vec3::new(10.0, 0.0, 4.0))
    };
    assert!(a.rotation_only_view().abs_diff_eq(b.rotation_only_view(), EPSILON));
    assert_eq!(a.rotation_only_view().w_axis, Vec4::W);
}
