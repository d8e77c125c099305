use serde::{Deserialize, Serialize};

use crate::utils::config::JsonConfig;

/// Serializable water parameters.
///
/// Values are not clamped here; [`WaterSurface::apply_config`](super::WaterSurface::apply_config)
/// routes them through the clamping setters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterConfig {
    pub enabled: bool,
    pub amplitude: f32,
    pub frequency: f32,
    pub speed: f32,
    pub extent: f32,
    pub height_offset: f32,
}

impl Default for WaterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            amplitude: 0.1,
            frequency: 0.35,
            speed: 0.6,
            extent: 120.0,
            height_offset: -1.5,
        }
    }
}

impl JsonConfig for WaterConfig {}
