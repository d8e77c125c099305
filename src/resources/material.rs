//! Materials
//!
//! A [`Material`] pairs the std140 uniform block ([`GpuMaterial`]) with
//! optional texture handles. Textures are bound separately from the block;
//! the block only carries flags telling the shader which ones are present.

use glam::Vec3;

use super::texture::TextureHandle;

/// Texture units used by the lit pass for material textures.
pub const BASE_COLOR_UNIT: u32 = 0;
pub const NORMAL_UNIT: u32 = 1;
pub const METALLIC_ROUGHNESS_UNIT: u32 = 2;
pub const EMISSIVE_UNIT: u32 = 3;

/// Uniform block binding point of the material block.
pub const MATERIAL_BINDING: u32 = 0;

/// std140 material block (64 bytes).
///
/// | Offset | Field            |
/// |--------|------------------|
/// | 0      | `base_color`     |
/// | 12     | `metallic`       |
/// | 16     | `roughness`      |
/// | 20     | `transmission`   |
/// | 32     | `emissive`       |
/// | 48     | `texture_flags`  |
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuMaterial {
    pub base_color: [f32; 3],
    pub metallic: f32,
    pub roughness: f32,
    pub transmission: f32,
    pub _pad0: [f32; 2],
    pub emissive: [f32; 3],
    pub _pad1: f32,
    /// `[base color, normal, metallic-roughness, emissive]`, 1 when bound.
    pub texture_flags: [i32; 4],
}

impl Default for GpuMaterial {
    fn default() -> Self {
        Self {
            base_color: [0.8, 0.8, 0.8],
            metallic: 0.0,
            roughness: 0.5,
            transmission: 0.0,
            _pad0: [0.0; 2],
            emissive: [0.0; 3],
            _pad1: 0.0,
            texture_flags: [0; 4],
        }
    }
}

/// Material slot kinds, in flag order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureSlot {
    BaseColor,
    Normal,
    MetallicRoughness,
    Emissive,
}

impl TextureSlot {
    pub const ALL: [TextureSlot; 4] = [
        Self::BaseColor,
        Self::Normal,
        Self::MetallicRoughness,
        Self::Emissive,
    ];

    #[must_use]
    pub const fn unit(self) -> u32 {
        match self {
            Self::BaseColor => BASE_COLOR_UNIT,
            Self::Normal => NORMAL_UNIT,
            Self::MetallicRoughness => METALLIC_ROUGHNESS_UNIT,
            Self::Emissive => EMISSIVE_UNIT,
        }
    }

    #[must_use]
    pub const fn uniform_name(self) -> &'static str {
        match self {
            Self::BaseColor => "baseColorTex",
            Self::Normal => "normalTex",
            Self::MetallicRoughness => "metallicRoughnessTex",
            Self::Emissive => "emissiveTex",
        }
    }
}

/// CPU-side material.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Material {
    pub gpu: GpuMaterial,
    pub base_color_texture: Option<TextureHandle>,
    pub normal_texture: Option<TextureHandle>,
    pub metallic_roughness_texture: Option<TextureHandle>,
    pub emissive_texture: Option<TextureHandle>,
}

impl Material {
    #[must_use]
    pub fn new(base_color: Vec3, metallic: f32, roughness: f32) -> Self {
        Self {
            gpu: GpuMaterial {
                base_color: base_color.to_array(),
                metallic,
                roughness,
                ..GpuMaterial::default()
            },
            ..Self::default()
        }
    }

    /// Dark blue-green, non-metallic, glossy and partially transmissive.
    #[must_use]
    pub fn water() -> Self {
        Self {
            gpu: GpuMaterial {
                base_color: [0.05, 0.18, 0.3],
                metallic: 0.0,
                roughness: 0.2,
                transmission: 0.4,
                ..GpuMaterial::default()
            },
            ..Self::default()
        }
    }

    #[must_use]
    pub fn texture(&self, slot: TextureSlot) -> Option<TextureHandle> {
        match slot {
            TextureSlot::BaseColor => self.base_color_texture,
            TextureSlot::Normal => self.normal_texture,
            TextureSlot::MetallicRoughness => self.metallic_roughness_texture,
            TextureSlot::Emissive => self.emissive_texture,
        }
    }

    pub fn set_texture(&mut self, slot: TextureSlot, handle: Option<TextureHandle>) {
        let target = match slot {
            TextureSlot::BaseColor => &mut self.base_color_texture,
            TextureSlot::Normal => &mut self.normal_texture,
            TextureSlot::MetallicRoughness => &mut self.metallic_roughness_texture,
            TextureSlot::Emissive => &mut self.emissive_texture,
        };
        *target = handle;
    }

    /// Uniform block with flags set for the slots `is_bound` accepts.
    #[must_use]
    pub fn gpu_data(&self, is_bound: impl Fn(TextureSlot) -> bool) -> GpuMaterial {
        let mut data = self.gpu;
        for slot in TextureSlot::ALL {
            data.texture_flags[slot as usize] = i32::from(is_bound(slot));
        }
        data
    }
}
