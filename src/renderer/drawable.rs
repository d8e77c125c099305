//! Drawables
//!
//! Anything the shadow driver and the lighting composer can render. Models
//! and the water surface both implement [`Drawable`], so the passes treat
//! them uniformly.

use glam::Mat4;

use super::commands::FrameRecorder;
use crate::resources::texture::TextureStore;

/// Everything a drawable needs while recording.
pub struct DrawContext<'a> {
    pub recorder: &'a mut FrameRecorder,
    pub textures: &'a TextureStore,
}

impl<'a> DrawContext<'a> {
    pub fn new(recorder: &'a mut FrameRecorder, textures: &'a TextureStore) -> Self {
        Self { recorder, textures }
    }
}

pub trait Drawable {
    /// Full material draw through `view_projection`. Used by the lit and
    /// environment passes.
    fn draw(&self, ctx: &mut DrawContext<'_>, view_projection: Mat4);

    /// Depth-only draw through a light-space matrix.
    fn draw_depth(&self, ctx: &mut DrawContext<'_>, light_space: Mat4);

    /// Depth-only draw into a cube face. The face matrices are already set
    /// by the shadow pass; only the model matrix is supplied here.
    fn draw_depth_cubemap(&self, ctx: &mut DrawContext<'_>);
}
