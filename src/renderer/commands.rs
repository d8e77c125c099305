//! Frame Command Recording
//!
//! Passes do not call into a graphics API. They append [`RenderCommand`]s to a
//! [`FrameRecorder`], which the external shading stage replays in order. The
//! recorder also owns the current viewport and the [`RenderStateMachine`], so
//! passes can save and restore both and tests can inspect them directly.

use glam::{Mat3, Mat4, Vec2, Vec3};

use super::render_state::{PipelineState, RenderMode, RenderStateMachine};
use crate::resources::gpu::{DepthAttachment, RawBufferId, RawFramebufferId, RawTextureId};

/// Shader programs the renderer switches between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Program {
    /// Per-light forward shading.
    Lit,
    /// Ambient/reflective pass against the environment cubemap.
    Environment,
    Skybox,
    /// Depth-only, light-space matrix.
    ShadowDepth,
    /// Depth-only into one cube face, linear distance to the light.
    ShadowCubeDepth,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Mat4(Mat4),
    Mat3(Mat3),
    Mat4Array(Vec<Mat4>),
    Vec3(Vec3),
    Vec2(Vec2),
    F32(f32),
    I32(i32),
    Bool(bool),
}

impl From<Mat4> for UniformValue {
    fn from(v: Mat4) -> Self {
        Self::Mat4(v)
    }
}

impl From<Mat3> for UniformValue {
    fn from(v: Mat3) -> Self {
        Self::Mat3(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        Self::Vec3(v)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        Self::Vec2(v)
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        Self::F32(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        Self::I32(v)
    }
}

impl From<bool> for UniformValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<[Mat4; 6]> for UniformValue {
    fn from(v: [Mat4; 6]) -> Self {
        Self::Mat4Array(v.to_vec())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[must_use]
    pub const fn square(size: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width: size,
            height: size,
        }
    }

    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    /// `None` selects the default (presentation) target.
    BindFramebuffer(Option<RawFramebufferId>),
    AttachDepth {
        framebuffer: RawFramebufferId,
        attachment: DepthAttachment,
    },
    SetViewport(Viewport),
    ClearDepth,
    SetPipelineState(PipelineState),
    UseProgram(Program),
    SetUniform {
        name: &'static str,
        value: UniformValue,
    },
    BindTexture {
        unit: u32,
        name: &'static str,
        texture: RawTextureId,
    },
    BindUniformBlock {
        name: &'static str,
        binding: u32,
        buffer: RawBufferId,
    },
    DrawIndexed {
        vertex_buffer: RawBufferId,
        index_buffer: RawBufferId,
        index_count: u32,
    },
    DrawArrays {
        vertex_buffer: RawBufferId,
        vertex_count: u32,
    },
}

/// Ordered command list for one frame.
#[derive(Debug)]
pub struct FrameRecorder {
    commands: Vec<RenderCommand>,
    viewport: Viewport,
    framebuffer: Option<RawFramebufferId>,
    program: Option<Program>,
    state: RenderStateMachine,
}

impl FrameRecorder {
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            commands: Vec::new(),
            viewport,
            framebuffer: None,
            program: None,
            state: RenderStateMachine::new(),
        }
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    #[must_use]
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Drains the recorded commands, keeping viewport and render state.
    pub fn take_commands(&mut self) -> Vec<RenderCommand> {
        std::mem::take(&mut self.commands)
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn framebuffer(&self) -> Option<RawFramebufferId> {
        self.framebuffer
    }

    #[must_use]
    pub fn program(&self) -> Option<Program> {
        self.program
    }

    #[must_use]
    pub fn mode(&self) -> RenderMode {
        self.state.mode()
    }

    #[must_use]
    pub fn render_state(&self) -> &RenderStateMachine {
        &self.state
    }

    // ========================================================================
    // Recording
    // ========================================================================

    pub fn enter_mode(&mut self, mode: RenderMode) {
        if let Some(state) = self.state.enter(mode) {
            self.commands.push(RenderCommand::SetPipelineState(state));
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.commands.push(RenderCommand::SetViewport(viewport));
    }

    pub fn bind_framebuffer(&mut self, framebuffer: Option<RawFramebufferId>) {
        self.framebuffer = framebuffer;
        self.commands.push(RenderCommand::BindFramebuffer(framebuffer));
    }

    pub fn attach_depth(&mut self, framebuffer: RawFramebufferId, attachment: DepthAttachment) {
        self.commands.push(RenderCommand::AttachDepth {
            framebuffer,
            attachment,
        });
    }

    pub fn clear_depth(&mut self) {
        self.commands.push(RenderCommand::ClearDepth);
    }

    pub fn use_program(&mut self, program: Program) {
        self.program = Some(program);
        self.commands.push(RenderCommand::UseProgram(program));
    }

    pub fn set_uniform(&mut self, name: &'static str, value: impl Into<UniformValue>) {
        self.commands.push(RenderCommand::SetUniform {
            name,
            value: value.into(),
        });
    }

    pub fn bind_texture(&mut self, unit: u32, name: &'static str, texture: RawTextureId) {
        self.commands.push(RenderCommand::BindTexture {
            unit,
            name,
            texture,
        });
    }

    pub fn bind_uniform_block(&mut self, name: &'static str, binding: u32, buffer: RawBufferId) {
        self.commands.push(RenderCommand::BindUniformBlock {
            name,
            binding,
            buffer,
        });
    }

    pub fn draw_indexed(
        &mut self,
        vertex_buffer: RawBufferId,
        index_buffer: RawBufferId,
        index_count: u32,
    ) {
        self.commands.push(RenderCommand::DrawIndexed {
            vertex_buffer,
            index_buffer,
            index_count,
        });
    }

    pub fn draw_arrays(&mut self, vertex_buffer: RawBufferId, vertex_count: u32) {
        self.commands.push(RenderCommand::DrawArrays {
            vertex_buffer,
            vertex_count,
        });
    }

    // ========================================================================
    // Queries used by tests and tooling
    // ========================================================================

    /// Number of draw commands recorded so far.
    #[must_use]
    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    RenderCommand::DrawIndexed { .. } | RenderCommand::DrawArrays { .. }
                )
            })
            .count()
    }

    /// Every value set for uniform `name`, in recording order.
    #[must_use]
    pub fn uniform_values(&self, name: &str) -> Vec<&UniformValue> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::SetUniform { name: n, value } if *n == name => Some(value),
                _ => None,
            })
            .collect()
    }
}
