//! Model & Scene Tests
//!
//! Tests for:
//! - Model construction from loader output
//! - Node hierarchy world transforms, re-parenting and cycle rejection
//! - Mesh world matrices and normal matrices
//! - Material texture binding during draws
//! - Scene texture and environment loading failures

use std::sync::Arc;

use glam::{Affine3A, Mat3, Mat4, Quat, Vec3};

use tidelight::errors::TidelightError;
use tidelight::renderer::drawable::{DrawContext, Drawable};
use tidelight::renderer::{FrameRecorder, RenderCommand, UniformValue, Viewport};
use tidelight::resources::gpu::DeviceRef;
use tidelight::resources::material::{BASE_COLOR_UNIT, GpuMaterial, NORMAL_UNIT, TextureSlot};
use tidelight::resources::texture::{TexelData, TextureStore, TextureWrap};
use tidelight::resources::{Cubemap, HeadlessDevice, Material, MeshData, Texture, TextureImage};
use tidelight::scene::model::normal_matrix;
use tidelight::scene::transform::Transform;
use tidelight::scene::{Model, NodeHierarchy, NodeIndex, Scene};

const EPSILON: f32 = 1e-5;

fn approx_vec3(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < EPSILON
}

fn headless() -> (Arc<HeadlessDevice>, DeviceRef) {
    let device = Arc::new(HeadlessDevice::new());
    let device_ref: DeviceRef = device.clone();
    (device, device_ref)
}

fn white_texture(device: &DeviceRef) -> Texture {
    let image = TextureImage {
        width: 1,
        height: 1,
        channels: 4,
        data: TexelData::Ldr(vec![255; 4]),
    };
    Texture::from_image(device, &image)
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn from_parts_requires_one_material_per_mesh() {
    let (_headless, device) = headless();
    let result = Model::from_parts(
        &device,
        &[MeshData::cube(1.0), MeshData::plane(2.0)],
        vec![Material::default()],
    );
    assert!(matches!(
        result,
        Err(TidelightError::MeshMaterialMismatch {
            meshes: 2,
            materials: 1
        })
    ));
}

#[test]
fn from_parts_uploads_each_mesh() {
    let (headless, device) = headless();
    let model = Model::from_parts(
        &device,
        &[MeshData::cube(1.0), MeshData::plane(2.0)],
        vec![Material::default(), Material::water()],
    )
    .expect("matching counts");

    assert_eq!(model.mesh_count(), 2);
    assert_eq!(model.materials()[1], Material::water());
    // Vertex + index + material block per mesh.
    assert_eq!(headless.live_buffers(), 6);

    drop(model);
    assert_eq!(headless.live_buffers(), 0);
    assert_eq!(headless.double_frees(), 0);
}

// ============================================================================
// Node Hierarchy
// ============================================================================

#[test]
fn child_world_composes_parent() {
    let mut hierarchy = NodeHierarchy::new();
    let root = hierarchy
        .add_node("root", Transform::from_translation(Vec3::X * 2.0), None)
        .expect("root");
    let child = hierarchy
        .add_node("child", Transform::from_translation(Vec3::Y), Some(root))
        .expect("child");

    let world = hierarchy.world_transform(child).expect("world");
    assert!(approx_vec3(world.translation.into(), Vec3::new(2.0, 1.0, 0.0)));
    assert_eq!(hierarchy.roots().collect::<Vec<_>>(), vec![root]);
    assert_eq!(hierarchy.node(root).expect("root").children(), &[child]);
}

#[test]
fn parent_change_propagates_to_grandchildren() {
    let mut hierarchy = NodeHierarchy::new();
    let a = hierarchy.add_node("a", Transform::IDENTITY, None).expect("a");
    let b = hierarchy
        .add_node("b", Transform::from_translation(Vec3::Z), Some(a))
        .expect("b");
    let c = hierarchy
        .add_node("c", Transform::from_translation(Vec3::Z), Some(b))
        .expect("c");

    let scaled = Transform::IDENTITY.with_scale(Vec3::splat(2.0));
    hierarchy.set_local_transform(a, scaled).expect("valid node");

    let world = hierarchy.world_transform(c).expect("world");
    assert!(approx_vec3(world.translation.into(), Vec3::new(0.0, 0.0, 4.0)));
}

#[test]
fn rotated_parent_rotates_child_offset() {
    let mut hierarchy = NodeHierarchy::new();
    let parent_local = Transform {
        rotation: Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
        ..Transform::IDENTITY
    };
    let parent = hierarchy.add_node("p", parent_local, None).expect("p");
    let child = hierarchy
        .add_node("c", Transform::from_translation(Vec3::X), Some(parent))
        .expect("c");

    let world = hierarchy.world_transform(child).expect("world");
    assert!(approx_vec3(world.translation.into(), Vec3::NEG_Z));
}

#[test]
fn reparent_and_detach() {
    let mut hierarchy = NodeHierarchy::new();
    let a = hierarchy
        .add_node("a", Transform::from_translation(Vec3::X), None)
        .expect("a");
    let b = hierarchy
        .add_node("b", Transform::from_translation(Vec3::Y * 3.0), None)
        .expect("b");
    let child = hierarchy
        .add_node("child", Transform::IDENTITY, Some(a))
        .expect("child");

    hierarchy.set_parent(child, Some(b)).expect("no cycle");
    let world = hierarchy.world_transform(child).expect("world");
    assert!(approx_vec3(world.translation.into(), Vec3::Y * 3.0));
    assert!(hierarchy.node(a).expect("a").children().is_empty());

    hierarchy.set_parent(child, None).expect("detach");
    assert_eq!(hierarchy.world_transform(child), Some(Affine3A::IDENTITY));
    assert_eq!(hierarchy.roots().count(), 3);
}

#[test]
fn cycles_are_rejected_without_change() {
    let mut hierarchy = NodeHierarchy::new();
    let a = hierarchy.add_node("a", Transform::IDENTITY, None).expect("a");
    let b = hierarchy.add_node("b", Transform::IDENTITY, Some(a)).expect("b");
    let c = hierarchy.add_node("c", Transform::IDENTITY, Some(b)).expect("c");

    assert!(matches!(
        hierarchy.set_parent(a, Some(c)),
        Err(TidelightError::HierarchyCycle { child: 0, parent: 2 })
    ));
    assert!(matches!(
        hierarchy.set_parent(a, Some(a)),
        Err(TidelightError::HierarchyCycle { .. })
    ));
    assert_eq!(hierarchy.node(a).expect("a").parent(), None);
    assert_eq!(hierarchy.node(c).expect("c").parent(), Some(b));
}

#[test]
fn invalid_indices_are_errors() {
    let mut hierarchy = NodeHierarchy::new();
    assert!(matches!(
        hierarchy.add_node("orphan", Transform::IDENTITY, Some(NodeIndex(3))),
        Err(TidelightError::InvalidNode { index: 3, count: 0 })
    ));
    assert!(hierarchy.is_empty());
    assert!(hierarchy.set_local_transform(NodeIndex(0), Transform::IDENTITY).is_err());
    assert_eq!(hierarchy.world_transform(NodeIndex(0)), None);
}

// ============================================================================
// Mesh & Normal Matrices
// ============================================================================

#[test]
fn mesh_world_matrix_uses_attached_node() {
    let (_headless, device) = headless();
    let mut model = Model::from_parts(
        &device,
        &[MeshData::cube(1.0), MeshData::cube(1.0)],
        vec![Material::default(), Material::default()],
    )
    .expect("model")
    .with_model_matrix(Mat4::from_translation(Vec3::X * 10.0));

    let node = model
        .add_node("arm", Transform::from_translation(Vec3::Y * 2.0), None)
        .expect("node");
    model.attach_mesh_to_node(1, node).expect("attach");

    let unattached = model.mesh_world_matrix(0);
    let attached = model.mesh_world_matrix(1);
    assert!(approx_vec3(unattached.w_axis.truncate(), Vec3::new(10.0, 0.0, 0.0)));
    assert!(approx_vec3(attached.w_axis.truncate(), Vec3::new(10.0, 2.0, 0.0)));

    model
        .set_node_transform(node, Transform::from_translation(Vec3::Y * 5.0))
        .expect("transform");
    assert!(approx_vec3(
        model.mesh_world_matrix(1).w_axis.truncate(),
        Vec3::new(10.0, 5.0, 0.0)
    ));
}

#[test]
fn attach_rejects_unknown_node_and_mesh() {
    let (_headless, device) = headless();
    let mut model =
        Model::from_parts(&device, &[MeshData::cube(1.0)], vec![Material::default()]).expect("model");
    assert!(model.attach_mesh_to_node(0, NodeIndex(0)).is_err());

    let node = model.add_node("n", Transform::IDENTITY, None).expect("node");
    assert!(model.attach_mesh_to_node(4, node).is_err());
    assert!(model.attach_mesh_to_node(0, node).is_ok());
}

#[test]
fn normal_matrix_is_inverse_transpose() {
    let model = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
    let n = normal_matrix(model);
    let expected = Mat3::from_diagonal(Vec3::new(0.5, 1.0, 1.0));
    assert!(n.abs_diff_eq(expected, EPSILON));

    // Pure rotations are their own normal matrix.
    let rotation = Mat4::from_rotation_z(0.7);
    assert!(normal_matrix(rotation).abs_diff_eq(Mat3::from_mat4(rotation), EPSILON));
}

// ============================================================================
// Drawing
// ============================================================================

#[test]
fn draw_binds_only_textures_present_in_store() {
    let (headless, device) = headless();
    let mut textures = TextureStore::with_key();
    let albedo = textures.insert(white_texture(&device));
    let normal = textures.insert(white_texture(&device));
    let albedo_id = textures[albedo].id();
    let normal_id = textures[normal].id();
    // Dangling handle: the slot must stay unbound.
    textures.remove(normal);

    let mut material = Material::default();
    material.set_texture(TextureSlot::BaseColor, Some(albedo));
    material.set_texture(TextureSlot::Normal, Some(normal));
    let model = Model::from_parts(&device, &[MeshData::cube(1.0)], vec![material]).expect("model");

    let mut recorder = FrameRecorder::new(Viewport::new(64, 64));
    let mut ctx = DrawContext::new(&mut recorder, &textures);
    model.draw(&mut ctx, Mat4::IDENTITY);

    let commands = recorder.commands();
    assert!(commands.contains(&RenderCommand::BindTexture {
        unit: BASE_COLOR_UNIT,
        name: TextureSlot::BaseColor.uniform_name(),
        texture: albedo_id,
    }));
    assert!(!commands.contains(&RenderCommand::BindTexture {
        unit: NORMAL_UNIT,
        name: TextureSlot::Normal.uniform_name(),
        texture: normal_id,
    }));

    let buffer = commands
        .iter()
        .find_map(|c| match c {
            RenderCommand::BindUniformBlock { name: "Material", buffer, .. } => Some(*buffer),
            _ => None,
        })
        .expect("material block bound");
    let bytes = headless.buffer_contents(buffer).expect("written");
    let block: GpuMaterial = bytemuck::pod_read_unaligned(&bytes);
    assert_eq!(block.texture_flags, [1, 0, 0, 0]);
    assert_eq!(recorder.draw_count(), 1);
}

#[test]
fn draw_uploads_matrices() {
    let (_headless, device) = headless();
    let model = Model::from_parts(&device, &[MeshData::cube(1.0)], vec![Material::default()])
        .expect("model")
        .with_model_matrix(Mat4::from_scale(Vec3::splat(3.0)));
    let textures = TextureStore::with_key();
    let view_projection = Mat4::from_translation(Vec3::Z);

    let mut recorder = FrameRecorder::new(Viewport::new(64, 64));
    let mut ctx = DrawContext::new(&mut recorder, &textures);
    model.draw(&mut ctx, view_projection);

    let model_matrix = model.model_matrix;
    assert_eq!(
        recorder.uniform_values("mvpMatrix"),
        vec![&UniformValue::Mat4(view_projection * model_matrix)]
    );
    assert_eq!(
        recorder.uniform_values("normalModelMatrix"),
        vec![&UniformValue::Mat3(normal_matrix(model_matrix))]
    );
    assert_eq!(
        recorder.uniform_values("hasTexCoords"),
        vec![&UniformValue::Bool(true)]
    );
}

#[test]
fn depth_draws_skip_material_state() {
    let (_headless, device) = headless();
    let model = Model::from_parts(&device, &[MeshData::cube(1.0)], vec![Material::default()])
        .expect("model");
    let textures = TextureStore::with_key();
    let mut recorder = FrameRecorder::new(Viewport::new(64, 64));
    let mut ctx = DrawContext::new(&mut recorder, &textures);
    model.draw_depth(&mut ctx, Mat4::IDENTITY);
    model.draw_depth_cubemap(&mut ctx);

    assert_eq!(recorder.draw_count(), 2);
    assert!(!recorder
        .commands()
        .iter()
        .any(|c| matches!(c, RenderCommand::BindUniformBlock { .. } | RenderCommand::BindTexture { .. })));
}

// ============================================================================
// Scene Loading
// ============================================================================

#[test]
fn missing_material_texture_stays_unbound() {
    let (_headless, device) = headless();
    let mut scene = Scene::new(&device);
    assert!(scene.load_material_texture("does/not/exist.png").is_none());
    assert!(scene.textures().is_empty());
    assert!(matches!(
        scene.load_texture("does/not/exist.png"),
        Err(TidelightError::AssetNotFound(_))
    ));
}

#[test]
fn failed_environment_load_keeps_previous() {
    let (_headless, device) = headless();
    let mut scene = Scene::new(&device);
    let image = TextureImage {
        width: 4,
        height: 2,
        channels: 4,
        data: TexelData::Hdr(vec![1.0; 4 * 2 * 4]),
    };
    let cubemap = Cubemap::from_equirectangular(&device, &image, 2).expect("cubemap");
    let id = cubemap.id();
    scene.set_environment(Some(cubemap));

    assert!(scene.set_environment_map("missing/sky.hdr", 16).is_err());
    assert_eq!(scene.environment().map(Cubemap::id), Some(id));
    assert!(scene.environment_source().is_none());
}

#[test]
fn environment_map_loads_from_disk() {
    let (headless, device) = headless();
    let path = std::env::temp_dir().join(format!("tidelight_env_{}.png", std::process::id()));
    image::RgbImage::from_pixel(8, 4, image::Rgb([200, 100, 50]))
        .save(&path)
        .expect("write png");

    let mut scene = Scene::new(&device);
    scene.set_environment_map(&path, 4).expect("loads");
    std::fs::remove_file(&path).ok();

    let environment = scene.environment().expect("environment");
    assert_eq!(environment.resolution(), 4);
    let source = scene.environment_source().expect("source");
    assert_eq!(source.wrap(), TextureWrap::Equirectangular);
    assert_eq!(
        headless.texture_desc(environment.id()).expect("live").format,
        wgpu::TextureFormat::Rgba32Float
    );
}
