//! Harbor demo.
//!
//! Builds a small scene (a pier on the water, a lighthouse lamp and a spot
//! light), flies the camera around a looping path and records a few frames.
//!
//! ```text
//! cargo run --example harbor -- [--gpu] [--frames N] [--env path/to/sky.hdr]
//! ```
//!
//! Without `--gpu` everything runs on the headless device.

use std::sync::Arc;

use glam::{Mat4, Vec3};

use tidelight::renderer::Viewport;
use tidelight::resources::DeviceRef;
use tidelight::scene::transform::Transform;
use tidelight::scene::PathAnimation;
use tidelight::{
    Camera, FrameRecorder, HeadlessDevice, Light, Material, MeshData, Model, RenderSettings, Scene,
    WaterSurface, WgpuDevice,
};

const FRAME_DT: f32 = 1.0 / 60.0;

struct Options {
    gpu: bool,
    frames: usize,
    environment: Option<String>,
}

fn parse_args() -> Options {
    let mut options = Options {
        gpu: false,
        frames: 120,
        environment: None,
    };
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--gpu" => options.gpu = true,
            "--frames" => {
                if let Some(n) = args.next().and_then(|v| v.parse().ok()) {
                    options.frames = n;
                }
            }
            "--env" => options.environment = args.next(),
            other => log::warn!("Ignoring unknown argument '{other}'"),
        }
    }
    options
}

fn build_pier(device: &DeviceRef) -> tidelight::Result<Model> {
    let planks = Material::new(Vec3::new(0.45, 0.3, 0.18), 0.0, 0.8);
    let post = Material::new(Vec3::new(0.25, 0.2, 0.15), 0.0, 0.9);
    let mut pier = Model::from_parts(
        device,
        &[MeshData::cube(1.0), MeshData::cube(1.0), MeshData::cube(1.0)],
        vec![planks, post.clone(), post],
    )?;

    let deck = pier.add_node(
        "deck",
        Transform::from_translation(Vec3::new(0.0, 0.5, 0.0)).with_scale(Vec3::new(3.0, 0.2, 12.0)),
        None,
    )?;
    let left = pier.add_node(
        "left post",
        Transform::from_translation(Vec3::new(-1.4, -1.0, 5.5)).with_scale(Vec3::new(0.3, 3.0, 0.3)),
        None,
    )?;
    let right = pier.add_node(
        "right post",
        Transform::from_translation(Vec3::new(1.4, -1.0, 5.5)).with_scale(Vec3::new(0.3, 3.0, 0.3)),
        None,
    )?;
    pier.attach_mesh_to_node(0, deck)?;
    pier.attach_mesh_to_node(1, left)?;
    pier.attach_mesh_to_node(2, right)?;
    Ok(pier)
}

fn build_scene(device: &DeviceRef, environment: Option<&str>) -> tidelight::Result<Scene> {
    let mut scene = Scene::new(device);

    scene.add_model(build_pier(device)?);
    let tower = Model::from_parts(
        device,
        &[MeshData::cube(1.0)],
        vec![Material::new(Vec3::new(0.9, 0.9, 0.85), 0.1, 0.4)],
    )?
    .with_model_matrix(
        Mat4::from_translation(Vec3::new(8.0, 4.0, -6.0)) * Mat4::from_scale(Vec3::new(1.5, 8.0, 1.5)),
    );
    scene.add_model(tower);

    let lamp = Light::point(device, Vec3::new(8.0, 9.0, -6.0), Vec3::new(1.0, 0.85, 0.6), 4.0);
    scene.add_light(lamp);

    let mut flood = Light::spot(device, Vec3::new(-6.0, 10.0, 8.0), Vec3::ONE, 6.0);
    flood.set_look_at_target(Vec3::ZERO);
    flood.set_spot_fov(50f32.to_radians());
    flood.set_shadow_range(0.5, 40.0);
    scene.add_light(flood);

    scene.add_camera(Camera::new_perspective(60.0, 16.0 / 9.0, 0.1, 300.0));
    scene.set_water(Some(WaterSurface::new(device)));

    if let Some(path) = environment
        && let Err(e) = scene.set_environment_map(path, 512)
    {
        log::warn!("Running without environment map: {e}");
    }

    Ok(scene)
}

fn main() -> tidelight::Result<()> {
    env_logger::init();
    let options = parse_args();

    let device: DeviceRef = if options.gpu {
        Arc::new(WgpuDevice::request_blocking(wgpu::PowerPreference::HighPerformance)?)
    } else {
        Arc::new(HeadlessDevice::new())
    };

    let mut scene = build_scene(&device, options.environment.as_deref())?;
    let settings = RenderSettings::default();
    let flight = PathAnimation::circle(Vec3::new(0.0, 6.0, 0.0), 25.0, 12, 30.0);

    let mut total_commands = 0;
    for frame in 0..options.frames {
        let elapsed = frame as f32 * FRAME_DT;
        let sample = flight.sample(elapsed);
        if let Some(camera) = scene.active_camera_mut() {
            camera.position = sample.position;
            camera.target = Vec3::ZERO;
        }

        scene.advance_water(sample.position, FRAME_DT);

        let mut recorder = FrameRecorder::new(Viewport::new(1280, 720));
        let shadows = scene.render_shadow_maps(&mut recorder, &settings);
        scene.draw_skybox(&mut recorder);
        scene.draw_environment(&mut recorder, &settings);
        let lit = scene.draw(&mut recorder, &settings);

        total_commands += recorder.commands().len();
        if frame % 30 == 0 {
            log::info!(
                "frame {frame}: {} spot / {} point shadows, {lit} lit passes, {} draws",
                shadows.spot_lights,
                shadows.point_lights,
                recorder.draw_count()
            );
        }
    }

    println!(
        "Recorded {} frames ({total_commands} commands), water rebuilt {} times",
        options.frames,
        scene.water().map_or(0, WaterSurface::rebuild_count)
    );
    Ok(())
}
