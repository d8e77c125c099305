//! Lighting Composer
//!
//! Multi-pass forward rendering. Per frame, after the shadow pass:
//!
//! 1. **Skybox**: rotation-only view, `LessEqual` depth ([`RenderMode::Skybox`]).
//! 2. **Environment**: every drawable with the environment program; writes
//!    depth normally.
//! 3. **Lit**: one full draw per light. Contributions accumulate with
//!    additive blending under `Equal` depth and no depth writes
//!    ([`RenderMode::AdditiveEqualDepth`]). Without an environment pass the
//!    first light lays down depth in [`RenderMode::Normal`] instead.
//!
//! Every pass is a no-op without a camera; the first two also require an
//! environment cubemap.

use glam::Vec2;

use super::commands::{FrameRecorder, Program};
use super::drawable::{DrawContext, Drawable};
use super::render_state::RenderMode;
use super::settings::RenderSettings;
use crate::resources::cubemap::{Cubemap, SkyboxCube};
use crate::resources::texture::TextureStore;
use crate::scene::camera::Camera;
use crate::scene::light::{Light, LightType, SHADOW_MAP_SIZE};

/// Texture unit of the environment cubemap in the skybox program.
pub const SKYBOX_UNIT: u32 = 0;
/// Texture unit of the environment cubemap in the environment program.
/// Kept clear of the material units 0..3.
pub const ENVIRONMENT_UNIT: u32 = 4;
pub const SHADOW_MAP_UNIT: u32 = 5;
pub const SHADOW_CUBEMAP_UNIT: u32 = 6;

/// Switches the environment program reads; shadow toggles are lit-only.
const ENVIRONMENT_SWITCHES: usize = 5;

/// Scene data shared by all composer passes.
#[derive(Clone, Copy)]
pub struct SceneView<'a> {
    pub camera: Option<&'a Camera>,
    pub environment: Option<&'a Cubemap>,
    pub env_brightness: f32,
    pub textures: &'a TextureStore,
    pub drawables: &'a [&'a dyn Drawable],
}

#[derive(Debug, Default)]
pub struct LightingComposer {
    lit_passes: usize,
}

impl LightingComposer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of per-light passes recorded by the last [`Self::draw`].
    #[must_use]
    pub fn lit_passes(&self) -> usize {
        self.lit_passes
    }

    /// Returns whether anything was recorded.
    pub fn draw_skybox(
        &self,
        recorder: &mut FrameRecorder,
        view: &SceneView<'_>,
        skybox: &SkyboxCube,
    ) -> bool {
        let (Some(camera), Some(environment)) = (view.camera, view.environment) else {
            return false;
        };

        recorder.enter_mode(RenderMode::Skybox);
        recorder.use_program(Program::Skybox);
        recorder.set_uniform("view", camera.rotation_only_view());
        recorder.set_uniform("projection", camera.projection_matrix());
        recorder.set_uniform("envBrightness", view.env_brightness);
        recorder.bind_texture(SKYBOX_UNIT, "skybox", environment.id());
        recorder.draw_arrays(skybox.vertex_buffer(), SkyboxCube::VERTEX_COUNT);
        recorder.enter_mode(RenderMode::Normal);
        true
    }

    /// Ambient and reflective contribution. Returns whether anything was
    /// recorded.
    pub fn draw_environment(
        &self,
        recorder: &mut FrameRecorder,
        view: &SceneView<'_>,
        settings: &RenderSettings,
    ) -> bool {
        let (Some(camera), Some(environment)) = (view.camera, view.environment) else {
            return false;
        };

        recorder.enter_mode(RenderMode::Normal);
        recorder.use_program(Program::Environment);
        for (name, enabled) in settings
            .shader_switches()
            .into_iter()
            .take(ENVIRONMENT_SWITCHES)
        {
            recorder.set_uniform(name, enabled);
        }
        recorder.bind_texture(ENVIRONMENT_UNIT, "environmentMap", environment.id());
        recorder.set_uniform("cameraPosition", camera.position);
        recorder.set_uniform("envBrightness", view.env_brightness);

        let view_projection = camera.view_projection_matrix();
        let mut ctx = DrawContext::new(recorder, view.textures);
        for drawable in view.drawables {
            drawable.draw(&mut ctx, view_projection);
        }
        true
    }

    /// Additive per-light loop. Returns the number of lights drawn.
    pub fn draw(
        &mut self,
        recorder: &mut FrameRecorder,
        view: &SceneView<'_>,
        lights: &[Light],
        settings: &RenderSettings,
    ) -> usize {
        self.lit_passes = 0;
        let Some(camera) = view.camera else {
            return 0;
        };
        if lights.is_empty() {
            return 0;
        }

        recorder.use_program(Program::Lit);
        for (name, enabled) in settings.shader_switches() {
            recorder.set_uniform(name, enabled);
        }
        recorder.set_uniform("cameraPosition", camera.position);
        let texel = 1.0 / SHADOW_MAP_SIZE as f32;
        recorder.set_uniform("shadowMapTexelSize", Vec2::splat(texel));

        let depth_established = view.environment.is_some();
        let view_projection = camera.view_projection_matrix();

        for (index, light) in lights.iter().enumerate() {
            let mode = if depth_established || index > 0 {
                RenderMode::AdditiveEqualDepth
            } else {
                RenderMode::Normal
            };
            recorder.enter_mode(mode);

            recorder.set_uniform("lightPosition", light.position);
            recorder.set_uniform("lightColor", light.color);
            recorder.set_uniform("lightIntensity", light.intensity);
            recorder.set_uniform("lightType", light.light_type.shader_id());
            recorder.set_uniform("lightDirection", light.direction());
            recorder.set_uniform("spotlightCosCutoff", light.spot_cos_cutoff());
            recorder.set_uniform("shadowFarPlane", light.shadow_far_plane());

            if settings.enable_shadows {
                bind_shadow_target(recorder, light);
            }

            let mut ctx = DrawContext::new(recorder, view.textures);
            for drawable in view.drawables {
                drawable.draw(&mut ctx, view_projection);
            }
            self.lit_passes += 1;
        }

        recorder.enter_mode(RenderMode::Normal);
        self.lit_passes
    }
}

fn bind_shadow_target(recorder: &mut FrameRecorder, light: &Light) {
    match light.light_type {
        LightType::Spot => {
            if let Some(map) = light.shadow_map_id() {
                recorder.set_uniform("lightSpaceMatrix", light.light_space_matrix());
                recorder.bind_texture(SHADOW_MAP_UNIT, "shadowMap", map);
            }
        }
        LightType::Point => {
            if let Some(cubemap) = light.shadow_cubemap_id() {
                recorder.bind_texture(SHADOW_CUBEMAP_UNIT, "shadowCubemap", cubemap);
            }
        }
    }
}

impl std::fmt::Debug for SceneView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneView")
            .field("camera", &self.camera)
            .field("environment", &self.environment)
            .field("env_brightness", &self.env_brightness)
            .field("drawables", &self.drawables.len())
            .finish_non_exhaustive()
    }
}
