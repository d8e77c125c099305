//! Render-State Machine
//!
//! Fixed-function state (depth test, depth write, blending, face culling) is
//! never toggled piecemeal. Each pass enters one named [`RenderMode`], and the
//! machine emits a single [`PipelineState`] change only when the mode
//! actually changes.
//!
//! | Mode                 | Depth test  | Depth write | Blend     | Cull  |
//! |----------------------|-------------|-------------|-----------|-------|
//! | `Normal`             | Less        | on          | off       | back  |
//! | `Skybox`             | LessEqual   | on          | off       | back  |
//! | `AdditiveEqualDepth` | Equal       | off         | one + one | back  |
//! | `ShadowDepth`        | Less        | on          | off       | front |

/// Named render-state configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderMode {
    #[default]
    Normal,
    Skybox,
    AdditiveEqualDepth,
    ShadowDepth,
}

/// Concrete fixed-function state for a [`RenderMode`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineState {
    pub depth_compare: wgpu::CompareFunction,
    pub depth_write: bool,
    pub blend: Option<wgpu::BlendState>,
    pub cull_mode: Option<wgpu::Face>,
}

/// Pure additive blending (`src * 1 + dst * 1`).
pub const ADDITIVE_BLEND: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

impl RenderMode {
    #[must_use]
    pub const fn pipeline_state(self) -> PipelineState {
        match self {
            Self::Normal => PipelineState {
                depth_compare: wgpu::CompareFunction::Less,
                depth_write: true,
                blend: None,
                cull_mode: Some(wgpu::Face::Back),
            },
            Self::Skybox => PipelineState {
                depth_compare: wgpu::CompareFunction::LessEqual,
                depth_write: true,
                blend: None,
                cull_mode: Some(wgpu::Face::Back),
            },
            Self::AdditiveEqualDepth => PipelineState {
                depth_compare: wgpu::CompareFunction::Equal,
                depth_write: false,
                blend: Some(ADDITIVE_BLEND),
                cull_mode: Some(wgpu::Face::Back),
            },
            Self::ShadowDepth => PipelineState {
                depth_compare: wgpu::CompareFunction::Less,
                depth_write: true,
                blend: None,
                cull_mode: Some(wgpu::Face::Front),
            },
        }
    }
}

impl PipelineState {
    /// Depth-stencil state for a pipeline targeting `format`.
    #[must_use]
    pub fn depth_stencil(&self, format: wgpu::TextureFormat) -> wgpu::DepthStencilState {
        wgpu::DepthStencilState {
            format,
            depth_write_enabled: Some(self.depth_write),
            depth_compare: Some(self.depth_compare),
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }
    }

    #[must_use]
    pub fn primitive(&self) -> wgpu::PrimitiveState {
        wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: self.cull_mode,
            ..Default::default()
        }
    }
}

/// Tracks the active [`RenderMode`].
#[derive(Debug, Default)]
pub struct RenderStateMachine {
    mode: RenderMode,
    transitions: usize,
}

impl RenderStateMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Number of mode changes so far.
    #[inline]
    #[must_use]
    pub fn transitions(&self) -> usize {
        self.transitions
    }

    /// Switches to `mode`. Returns the new state when it differs from the
    /// active one, `None` otherwise.
    pub fn enter(&mut self, mode: RenderMode) -> Option<PipelineState> {
        if self.mode == mode {
            return None;
        }
        log::trace!("Render mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
        self.transitions += 1;
        Some(mode.pipeline_state())
    }
}
