//! # Tidelight
//!
//! Shadowed multi-light forward rendering with a procedural water surface.
//!
//! Each frame the render loop calls, in order:
//!
//! ```rust,ignore
//! scene.advance_water(camera_position, dt);
//! scene.render_shadow_maps(&mut recorder, &settings);
//! scene.draw_skybox(&mut recorder);
//! scene.draw_environment(&mut recorder, &settings);
//! scene.draw(&mut recorder, &settings);
//! ```
//!
//! GPU resources go through the [`GpuDevice`](resources::gpu::GpuDevice)
//! trait, backed by `wgpu` or by the CPU-only
//! [`HeadlessDevice`](resources::HeadlessDevice).

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod errors;
pub mod renderer;
pub mod resources;
pub mod scene;
pub mod utils;
pub mod water;

pub use errors::{Result, TidelightError};
pub use renderer::{FrameRecorder, RenderSettings};
pub use resources::{Cubemap, HeadlessDevice, Material, MeshData, Texture, WgpuDevice};
pub use scene::{Camera, Light, LightType, Model, Scene};
pub use water::{NoiseField, WaterConfig, WaterSurface};
