//! Render Settings
//!
//! Per-frame toggles consumed by the shadow driver and the lighting
//! composer. Apart from `enable_shadows`, which gates the shadow pass, every
//! flag is forwarded to the shading stage as a boolean uniform.
//!
//! ```rust,ignore
//! use tidelight::renderer::RenderSettings;
//! use tidelight::utils::JsonConfig;
//!
//! let settings = RenderSettings::from_json_str(r#"{ "enable_shadows": false }"#)?;
//! assert!(settings.enable_tone_mapping);
//! ```

use serde::{Deserialize, Serialize};

use crate::utils::config::JsonConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub enable_color_textures: bool,
    pub enable_normal_textures: bool,
    pub enable_metallic_textures: bool,
    pub enable_tone_mapping: bool,
    pub enable_gamma_correction: bool,
    pub enable_shadows: bool,
    /// Percentage-closer filtering when sampling shadow maps.
    pub enable_shadow_pcf: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            enable_color_textures: true,
            enable_normal_textures: true,
            enable_metallic_textures: true,
            enable_tone_mapping: true,
            enable_gamma_correction: true,
            enable_shadows: true,
            enable_shadow_pcf: true,
        }
    }
}

impl RenderSettings {
    /// Flags in the order they are uploaded, keyed by uniform name.
    #[must_use]
    pub fn shader_switches(&self) -> [(&'static str, bool); 7] {
        [
            ("enableColorTextures", self.enable_color_textures),
            ("enableNormalTextures", self.enable_normal_textures),
            ("enableMetallicTextures", self.enable_metallic_textures),
            ("enableToneMapping", self.enable_tone_mapping),
            ("enableGammaCorrection", self.enable_gamma_correction),
            ("enableShadows", self.enable_shadows),
            ("enableShadowPCF", self.enable_shadow_pcf),
        ]
    }
}

impl JsonConfig for RenderSettings {}
