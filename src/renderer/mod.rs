//! Renderer module
//!
//! Passes record into a [`FrameRecorder`]; executing the recorded commands
//! is left to the shading stage.
//!
//! - `shadow`: per-light depth passes
//! - `composer`: skybox, environment and additive lit passes
//! - `render_state`: named pipeline-state modes
//! - `commands`: the command list and recorder

pub mod commands;
pub mod composer;
pub mod drawable;
pub mod render_state;
pub mod settings;
pub mod shadow;
pub mod shadow_utils;

pub use commands::{FrameRecorder, Program, RenderCommand, UniformValue, Viewport};
pub use composer::{LightingComposer, SceneView};
pub use drawable::{DrawContext, Drawable};
pub use render_state::{PipelineState, RenderMode, RenderStateMachine};
pub use settings::RenderSettings;
pub use shadow::{ShadowPassDriver, ShadowPassState, ShadowPassStats};
