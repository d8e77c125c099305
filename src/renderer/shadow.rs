//! Shadow Pass Driver
//!
//! Renders every light's depth target once per frame, before the lighting
//! passes:
//!
//! - **Spot** lights get a perspective light-space matrix (aspect 1, the
//!   light's cone angle and shadow range) and a depth-only draw of every
//!   drawable into their 2D shadow map at [`SHADOW_MAP_SIZE`]².
//! - **Point** lights get six 90° cube-face matrices and one depth-only
//!   draw per face, each into its own face of the depth cubemap.
//!
//! The pass runs in [`RenderMode::ShadowDepth`] (front-face culling), saves
//! the caller's viewport and restores it together with
//! [`RenderMode::Normal`] and the default framebuffer when done.

use super::commands::{FrameRecorder, Program, Viewport};
use super::drawable::{DrawContext, Drawable};
use super::render_state::RenderMode;
use super::settings::RenderSettings;
use super::shadow_utils::{build_point_face_vps, build_spot_vp};
use crate::resources::gpu::CubeFace;
use crate::resources::texture::TextureStore;
use crate::scene::light::{Light, LightType, SHADOW_CUBEMAP_SIZE, SHADOW_MAP_SIZE};

/// Where the driver is within a frame's shadow work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadowPassState {
    #[default]
    Idle,
    RenderingSpotDepth,
    RenderingPointDepthFace(CubeFace),
}

/// Per-frame summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShadowPassStats {
    pub spot_lights: usize,
    pub point_lights: usize,
    pub skipped_lights: usize,
}

#[derive(Debug, Default)]
pub struct ShadowPassDriver {
    state: ShadowPassState,
    /// States entered during the last run, in order.
    history: Vec<ShadowPassState>,
}

impl ShadowPassDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> ShadowPassState {
        self.state
    }

    #[must_use]
    pub fn history(&self) -> &[ShadowPassState] {
        &self.history
    }

    fn transition(&mut self, state: ShadowPassState) {
        self.state = state;
        self.history.push(state);
    }

    /// Renders all shadow maps. Does nothing unless shadows are enabled and
    /// there is at least one light and one drawable.
    pub fn render(
        &mut self,
        recorder: &mut FrameRecorder,
        textures: &TextureStore,
        lights: &mut [Light],
        drawables: &[&dyn Drawable],
        settings: &RenderSettings,
    ) -> ShadowPassStats {
        self.history.clear();
        let mut stats = ShadowPassStats::default();

        if !settings.enable_shadows || lights.is_empty() || drawables.is_empty() {
            return stats;
        }

        let previous_viewport = recorder.viewport();
        recorder.enter_mode(RenderMode::ShadowDepth);

        for (index, light) in lights.iter_mut().enumerate() {
            let rendered = match light.light_type {
                LightType::Spot => self.render_spot(recorder, textures, light, drawables),
                LightType::Point => self.render_point(recorder, textures, light, drawables),
            };

            match (rendered, light.light_type) {
                (true, LightType::Spot) => stats.spot_lights += 1,
                (true, LightType::Point) => stats.point_lights += 1,
                (false, _) => {
                    log::warn!("Shadow pass: light {index} has no depth target, skipped");
                    stats.skipped_lights += 1;
                }
            }
        }

        recorder.bind_framebuffer(None);
        recorder.enter_mode(RenderMode::Normal);
        recorder.set_viewport(previous_viewport);
        self.transition(ShadowPassState::Idle);

        stats
    }

    fn render_spot(
        &mut self,
        recorder: &mut FrameRecorder,
        textures: &TextureStore,
        light: &mut Light,
        drawables: &[&dyn Drawable],
    ) -> bool {
        let light_space = build_spot_vp(
            light.position,
            light.direction(),
            light.spot_fov(),
            light.shadow_near_plane(),
            light.shadow_far_plane(),
        );
        light.set_light_space_matrix(light_space);

        let Some((framebuffer, attachment)) = light.spot_target() else {
            return false;
        };
        self.transition(ShadowPassState::RenderingSpotDepth);

        recorder.set_viewport(Viewport::square(SHADOW_MAP_SIZE));
        recorder.bind_framebuffer(Some(framebuffer));
        recorder.attach_depth(framebuffer, attachment);
        recorder.clear_depth();
        recorder.use_program(Program::ShadowDepth);
        recorder.set_uniform("lightSpaceMatrix", light_space);

        let mut ctx = DrawContext::new(recorder, textures);
        for drawable in drawables {
            drawable.draw_depth(&mut ctx, light_space);
        }
        true
    }

    fn render_point(
        &mut self,
        recorder: &mut FrameRecorder,
        textures: &TextureStore,
        light: &mut Light,
        drawables: &[&dyn Drawable],
    ) -> bool {
        let far = light.shadow_far_plane();
        let transforms = build_point_face_vps(light.position, light.shadow_near_plane(), far);
        light.set_shadow_transforms(transforms);

        let Some(framebuffer) = light.cube_target() else {
            return false;
        };
        let resolution = light
            .shadow_cubemap()
            .map_or(SHADOW_CUBEMAP_SIZE, |c| c.resolution());

        recorder.set_viewport(Viewport::square(resolution));
        recorder.bind_framebuffer(Some(framebuffer));
        recorder.use_program(Program::ShadowCubeDepth);
        recorder.set_uniform("shadowMatrices", transforms);
        recorder.set_uniform("lightPosition", light.position);
        recorder.set_uniform("farPlane", far);

        for face in CubeFace::ALL {
            let Some((framebuffer, attachment)) = light.attach_cube_face(face) else {
                return false;
            };
            self.transition(ShadowPassState::RenderingPointDepthFace(face));

            recorder.attach_depth(framebuffer, attachment);
            recorder.clear_depth();
            recorder.set_uniform("faceIndex", face.index() as i32);
            recorder.set_uniform("shadowMatrix", transforms[face.index()]);

            let mut ctx = DrawContext::new(recorder, textures);
            for drawable in drawables {
                drawable.draw_depth_cubemap(&mut ctx);
            }
        }
        true
    }
}
