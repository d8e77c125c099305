//! Shadow Pass Tests
//!
//! Tests for:
//! - Spot light-space matrix construction
//! - Point light cube-face matrices (face centers, up vectors)
//! - ShadowPassDriver state machine, skip conditions and command stream
//! - End-to-end spot shadow through the scene

use std::sync::Arc;

use glam::{Mat4, Vec3, Vec4};

use tidelight::renderer::shadow_utils::{build_point_face_vps, build_spot_vp};
use tidelight::renderer::{
    FrameRecorder, Program, RenderCommand, RenderMode, RenderSettings, ShadowPassState, Viewport,
};
use tidelight::resources::gpu::{CubeFace, DepthAttachment, DeviceRef};
use tidelight::resources::{HeadlessDevice, Material, MeshData};
use tidelight::scene::{Camera, Light, LightType, Model, Scene};

const EPSILON: f32 = 1e-4;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn headless() -> (Arc<HeadlessDevice>, DeviceRef) {
    let device = Arc::new(HeadlessDevice::new());
    let device_ref: DeviceRef = device.clone();
    (device, device_ref)
}

fn project(matrix: Mat4, point: Vec3) -> Vec3 {
    let clip = matrix * Vec4::new(point.x, point.y, point.z, 1.0);
    clip.truncate() / clip.w
}

fn cube_model(device: &DeviceRef) -> Model {
    Model::from_parts(device, &[MeshData::cube(1.0)], vec![Material::default()])
        .expect("one material per mesh")
}

fn scene_with(device: &DeviceRef, light: Light) -> Scene {
    let mut scene = Scene::new(device);
    scene.add_model(cube_model(device));
    scene.add_light(light);
    scene.add_camera(Camera::default());
    scene
}

// ============================================================================
// Spot Light Matrix
// ============================================================================

#[test]
fn spot_matrix_centers_target() {
    let position = Vec3::new(0.0, 10.0, 10.0);
    let direction = (Vec3::ZERO - position).normalize();
    let vp = build_spot_vp(position, direction, 45.0_f32.to_radians(), 0.1, 50.0);

    let ndc = project(vp, Vec3::ZERO);
    assert!(approx(ndc.x, 0.0));
    assert!(approx(ndc.y, 0.0));
    assert!(ndc.z > 0.0 && ndc.z < 1.0);
}

#[test]
fn spot_matrix_handles_straight_down() {
    let vp = build_spot_vp(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y, 1.0, 0.1, 20.0);
    assert!(vp.is_finite());
    let ndc = project(vp, Vec3::ZERO);
    assert!(approx(ndc.x, 0.0) && approx(ndc.y, 0.0));
}

#[test]
fn spot_matrix_zero_direction_falls_back_to_down() {
    let position = Vec3::new(1.0, 4.0, -2.0);
    let a = build_spot_vp(position, Vec3::ZERO, 1.0, 0.1, 20.0);
    let b = build_spot_vp(position, Vec3::NEG_Y, 1.0, 0.1, 20.0);
    assert_eq!(a, b);
}

// ============================================================================
// Cube Faces
// ============================================================================

#[test]
fn face_direction_maps_to_face_center() {
    let position = Vec3::new(2.0, -1.0, 3.0);
    let vps = build_point_face_vps(position, 0.1, 25.0);

    for face in CubeFace::ALL {
        let ndc = project(vps[face.index()], position + face.direction());
        assert!(approx(ndc.x, 0.0), "{face:?}: x = {}", ndc.x);
        assert!(approx(ndc.y, 0.0), "{face:?}: y = {}", ndc.y);
        assert!(ndc.z > 0.0 && ndc.z < 1.0, "{face:?}: z = {}", ndc.z);
    }
}

#[test]
fn face_direction_is_behind_other_faces_or_off_screen() {
    let vps = build_point_face_vps(Vec3::ZERO, 0.1, 25.0);
    let point = Vec3::X;
    let clip = vps[CubeFace::NegativeX.index()] * point.extend(1.0);
    // Behind the -X camera.
    assert!(clip.w < 0.0);
}

#[test]
fn face_up_vectors_follow_convention() {
    let vps = build_point_face_vps(Vec3::ZERO, 0.1, 25.0);
    for face in CubeFace::ALL {
        let probe = face.direction() + face.up() * 0.5;
        let ndc = project(vps[face.index()], probe);
        assert!(ndc.y > 0.0, "{face:?}: up vector should appear above center");
        assert!(approx(ndc.x, 0.0));
    }
}

#[test]
fn face_corners_stay_within_ninety_degrees() {
    let vps = build_point_face_vps(Vec3::ZERO, 0.1, 25.0);
    let ndc = project(
        vps[CubeFace::PositiveZ.index()],
        Vec3::new(0.99, 0.99, 1.0),
    );
    assert!(ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0);
}

// ============================================================================
// Driver: skip conditions
// ============================================================================

#[test]
fn shadows_disabled_records_nothing() {
    let (_headless, device) = headless();
    let mut scene = scene_with(&device, Light::spot(&device, Vec3::Y * 5.0, Vec3::ONE, 1.0));
    let mut recorder = FrameRecorder::new(Viewport::new(1280, 720));
    let settings = RenderSettings {
        enable_shadows: false,
        ..RenderSettings::default()
    };

    let stats = scene.render_shadow_maps(&mut recorder, &settings);
    assert!(recorder.commands().is_empty());
    assert_eq!(stats.spot_lights + stats.point_lights, 0);
}

#[test]
fn no_lights_or_no_drawables_records_nothing() {
    let (_headless, device) = headless();
    let settings = RenderSettings::default();

    let mut no_lights = Scene::new(&device);
    no_lights.add_model(cube_model(&device));
    let mut recorder = FrameRecorder::new(Viewport::new(1280, 720));
    no_lights.render_shadow_maps(&mut recorder, &settings);
    assert!(recorder.commands().is_empty());

    let mut no_models = Scene::new(&device);
    no_models.add_light(Light::point(&device, Vec3::Y, Vec3::ONE, 1.0));
    no_models.render_shadow_maps(&mut recorder, &settings);
    assert!(recorder.commands().is_empty());
}

// ============================================================================
// Driver: spot lights
// ============================================================================

#[test]
fn spot_pass_command_stream() {
    let (_headless, device) = headless();
    let mut scene = scene_with(&device, Light::spot(&device, Vec3::Y * 5.0, Vec3::ONE, 1.0));
    let mut recorder = FrameRecorder::new(Viewport::new(1280, 720));

    let stats = scene.render_shadow_maps(&mut recorder, &RenderSettings::default());
    assert_eq!(stats.spot_lights, 1);

    let light = &scene.lights()[0];
    let (fb, attachment) = light.spot_target().expect("spot target");
    let commands = recorder.commands();

    assert!(matches!(
        commands[0],
        RenderCommand::SetPipelineState(state) if state == RenderMode::ShadowDepth.pipeline_state()
    ));
    assert_eq!(commands[1], RenderCommand::SetViewport(Viewport::square(1024)));
    assert_eq!(commands[2], RenderCommand::BindFramebuffer(Some(fb)));
    assert_eq!(
        commands[3],
        RenderCommand::AttachDepth {
            framebuffer: fb,
            attachment
        }
    );
    assert_eq!(commands[4], RenderCommand::ClearDepth);
    assert_eq!(commands[5], RenderCommand::UseProgram(Program::ShadowDepth));
    assert_eq!(recorder.draw_count(), 1);

    assert_eq!(
        scene.shadow_driver().history(),
        &[ShadowPassState::RenderingSpotDepth, ShadowPassState::Idle]
    );
}

#[test]
fn pass_restores_viewport_framebuffer_and_mode() {
    let (_headless, device) = headless();
    let mut scene = scene_with(&device, Light::spot(&device, Vec3::Y * 5.0, Vec3::ONE, 1.0));
    scene.add_light(Light::point(&device, Vec3::X * 3.0, Vec3::ONE, 1.0));
    let viewport = Viewport::new(1280, 720);
    let mut recorder = FrameRecorder::new(viewport);

    scene.render_shadow_maps(&mut recorder, &RenderSettings::default());

    assert_eq!(recorder.viewport(), viewport);
    assert_eq!(recorder.framebuffer(), None);
    assert_eq!(recorder.mode(), RenderMode::Normal);
    assert_eq!(scene.shadow_driver().state(), ShadowPassState::Idle);
    let state = recorder.render_state().mode().pipeline_state();
    assert!(state.depth_write);
    assert_eq!(state.cull_mode, Some(wgpu::Face::Back));
}

#[test]
fn shadow_depth_mode_culls_front_faces() {
    let state = RenderMode::ShadowDepth.pipeline_state();
    assert_eq!(state.cull_mode, Some(wgpu::Face::Front));
    assert!(state.depth_write);
    assert!(state.blend.is_none());
}

#[test]
fn spot_light_space_stored_on_light() {
    let (_headless, device) = headless();
    let mut light = Light::spot(&device, Vec3::new(0.0, 10.0, 10.0), Vec3::ONE, 1.0);
    light.set_look_at_target(Vec3::ZERO);
    let mut scene = scene_with(&device, light);
    let mut recorder = FrameRecorder::new(Viewport::new(1280, 720));

    scene.render_shadow_maps(&mut recorder, &RenderSettings::default());

    let light = &scene.lights()[0];
    let expected = build_spot_vp(
        light.position,
        light.direction(),
        light.spot_fov(),
        light.shadow_near_plane(),
        light.shadow_far_plane(),
    );
    assert_eq!(light.light_space_matrix(), expected);
    assert_eq!(
        recorder.uniform_values("lightSpaceMatrix"),
        vec![&tidelight::renderer::UniformValue::Mat4(expected)]
    );
}

#[test]
fn end_to_end_spot_shadow_covers_model_origin() {
    let (_headless, device) = headless();
    let mut light = Light::spot(&device, Vec3::new(0.0, 10.0, 10.0), Vec3::ONE, 1.0);
    light.set_look_at_target(Vec3::ZERO);
    let mut scene = scene_with(&device, light);
    let mut recorder = FrameRecorder::new(Viewport::new(1280, 720));

    scene.render_shadow_maps(&mut recorder, &RenderSettings::default());

    let ndc = project(scene.lights()[0].light_space_matrix(), Vec3::ZERO);
    assert!((-1.0..=1.0).contains(&ndc.x));
    assert!((-1.0..=1.0).contains(&ndc.y));
    assert!((-1.0..=1.0).contains(&ndc.z));
}

// ============================================================================
// Driver: point lights
// ============================================================================

#[test]
fn point_pass_renders_six_faces() {
    let (headless, device) = headless();
    let mut scene = scene_with(&device, Light::point(&device, Vec3::Y * 4.0, Vec3::ONE, 1.0));
    let mut recorder = FrameRecorder::new(Viewport::new(1280, 720));

    let stats = scene.render_shadow_maps(&mut recorder, &RenderSettings::default());
    assert_eq!(stats.point_lights, 1);
    assert_eq!(recorder.draw_count(), 6);

    let light = &scene.lights()[0];
    let cube_id = light.shadow_cubemap_id().expect("cubemap");
    let attached: Vec<DepthAttachment> = recorder
        .commands()
        .iter()
        .filter_map(|c| match c {
            RenderCommand::AttachDepth { attachment, .. } => Some(*attachment),
            _ => None,
        })
        .collect();
    let expected: Vec<DepthAttachment> = CubeFace::ALL
        .iter()
        .map(|&face| DepthAttachment::CubeFace(cube_id, face))
        .collect();
    assert_eq!(attached, expected);

    assert!(recorder
        .commands()
        .contains(&RenderCommand::SetViewport(Viewport::square(512))));
    assert!(recorder
        .commands()
        .contains(&RenderCommand::UseProgram(Program::ShadowCubeDepth)));

    let mut expected_history: Vec<ShadowPassState> = CubeFace::ALL
        .iter()
        .map(|&face| ShadowPassState::RenderingPointDepthFace(face))
        .collect();
    expected_history.push(ShadowPassState::Idle);
    assert_eq!(scene.shadow_driver().history(), expected_history.as_slice());

    let fb = light.cube_target().expect("cube fb");
    assert_eq!(
        headless.framebuffer_attachment(fb),
        Some(DepthAttachment::CubeFace(cube_id, CubeFace::NegativeZ))
    );
}

#[test]
fn point_face_matrices_stored_and_uploaded() {
    let (_headless, device) = headless();
    let mut scene = scene_with(&device, Light::point(&device, Vec3::new(1.0, 2.0, 3.0), Vec3::ONE, 1.0));
    scene.lights_mut()[0].set_shadow_range(0.2, 30.0);
    let mut recorder = FrameRecorder::new(Viewport::new(1280, 720));

    scene.render_shadow_maps(&mut recorder, &RenderSettings::default());

    let expected = build_point_face_vps(Vec3::new(1.0, 2.0, 3.0), 0.2, 30.0);
    assert_eq!(scene.lights()[0].shadow_transforms(), &expected);
    assert_eq!(
        recorder.uniform_values("shadowMatrices"),
        vec![&tidelight::renderer::UniformValue::Mat4Array(expected.to_vec())]
    );
    assert_eq!(
        recorder.uniform_values("farPlane"),
        vec![&tidelight::renderer::UniformValue::F32(30.0)]
    );
}

#[test]
fn light_without_target_is_skipped() {
    let (_headless, device) = headless();
    let mut broken = Light::spot(&device, Vec3::Y * 5.0, Vec3::ONE, 1.0);
    broken.set_shadow_map(None);
    let mut scene = scene_with(&device, broken);
    scene.add_light(Light::point(&device, Vec3::Y, Vec3::ONE, 1.0));
    let mut recorder = FrameRecorder::new(Viewport::new(1280, 720));

    let stats = scene.render_shadow_maps(&mut recorder, &RenderSettings::default());
    assert_eq!(stats.skipped_lights, 1);
    assert_eq!(stats.point_lights, 1);
    assert_eq!(recorder.draw_count(), 6);
}

#[test]
fn runtime_type_switch_uses_other_target() {
    let (_headless, device) = headless();
    let mut scene = scene_with(&device, Light::spot(&device, Vec3::Y * 5.0, Vec3::ONE, 1.0));
    scene.lights_mut()[0].light_type = LightType::Point;
    let mut recorder = FrameRecorder::new(Viewport::new(1280, 720));

    let stats = scene.render_shadow_maps(&mut recorder, &RenderSettings::default());
    assert_eq!(stats.point_lights, 1);
    assert_eq!(stats.spot_lights, 0);
}

#[test]
fn enabled_water_casts_shadows() {
    let (_headless, device) = headless();
    let mut scene = scene_with(&device, Light::spot(&device, Vec3::Y * 5.0, Vec3::ONE, 1.0));
    let mut water = tidelight::water::WaterSurface::with_resolution(&device, 4);
    water.advance(Vec3::ZERO, 0.016);
    scene.set_water(Some(water));
    let mut recorder = FrameRecorder::new(Viewport::new(1280, 720));

    scene.render_shadow_maps(&mut recorder, &RenderSettings::default());
    assert_eq!(recorder.draw_count(), 2);
}
