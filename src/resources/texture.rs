//! Textures
//!
//! Decoding goes through the `image` crate into a [`TextureImage`] (CPU
//! texels), which is then uploaded as a [`Texture`]. HDR sources are detected
//! by extension (`.hdr`, `.exr`) and kept as `f32` texels.
//!
//! The GPU layer has no three-channel formats, so RGB sources are expanded
//! to RGBA on upload. The reported channel count stays the source's.

use std::path::Path;

use super::gpu::{DeviceRef, GpuTexture, RawTextureId, TextureDesc, TextureKind};
use crate::errors::{Result, TidelightError};

slotmap::new_key_type! {
    /// Handle into the scene's texture store.
    pub struct TextureHandle;
}

/// Textures owned by a scene, addressed by [`TextureHandle`].
pub type TextureStore = slotmap::SlotMap<TextureHandle, Texture>;

/// Decoded texel storage.
#[derive(Debug, Clone, PartialEq)]
pub enum TexelData {
    /// 8-bit unsigned normalized texels.
    Ldr(Vec<u8>),
    /// Linear floating-point texels.
    Hdr(Vec<f32>),
}

/// A decoded image held in CPU memory.
///
/// `data` is stored with 1 or 4 components per texel (RGB is expanded).
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    /// Channel count of the source file (1, 3 or 4).
    pub channels: u8,
    pub data: TexelData,
}

impl TextureImage {
    /// Decodes an image from disk. HDR is inferred from the file extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Self::load_with(path, is_hdr_path(path))
    }

    /// Decodes an image from disk, forcing HDR storage when `hdr` is true.
    pub fn load_with(path: &Path, hdr: bool) -> Result<Self> {
        let display = path.display().to_string();
        if !path.exists() {
            log::warn!("Texture file '{display}' does not exist");
            return Err(TidelightError::AssetNotFound(display));
        }

        let image = image::open(path).map_err(|source| TidelightError::ImageDecode {
            path: display.clone(),
            source,
        })?;

        let decoded = Self::from_dynamic(&image, hdr).map_err(|channels| {
            TidelightError::UnsupportedChannelCount {
                path: display.clone(),
                channels,
            }
        })?;

        log::info!(
            "Loaded {} texture: '{display}' ({}x{}, {} channels)",
            if hdr { "HDR" } else { "LDR" },
            decoded.width,
            decoded.height,
            decoded.channels
        );
        Ok(decoded)
    }

    /// Converts a decoded image. Fails with the channel count when it is not 1, 3 or 4.
    pub fn from_dynamic(image: &image::DynamicImage, hdr: bool) -> std::result::Result<Self, u8> {
        let channels = image.color().channel_count();
        let (width, height) = (image.width(), image.height());

        let data = match (channels, hdr) {
            (1, false) => TexelData::Ldr(image.to_luma8().into_raw()),
            (3 | 4, false) => TexelData::Ldr(image.to_rgba8().into_raw()),
            (1, true) => TexelData::Hdr(image.to_luma32f().into_raw()),
            (3 | 4, true) => TexelData::Hdr(image.to_rgba32f().into_raw()),
            (other, _) => return Err(other),
        };

        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    #[must_use]
    pub fn is_hdr(&self) -> bool {
        matches!(self.data, TexelData::Hdr(_))
    }

    /// Components per stored texel (1 or 4).
    #[must_use]
    pub fn components(&self) -> usize {
        if self.channels == 1 { 1 } else { 4 }
    }

    #[must_use]
    pub fn format(&self) -> wgpu::TextureFormat {
        match (self.components(), self.is_hdr()) {
            (1, false) => wgpu::TextureFormat::R8Unorm,
            (_, false) => wgpu::TextureFormat::Rgba8Unorm,
            (1, true) => wgpu::TextureFormat::R32Float,
            (_, true) => wgpu::TextureFormat::Rgba32Float,
        }
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        match &self.data {
            TexelData::Ldr(data) => data,
            TexelData::Hdr(data) => bytemuck::cast_slice(data),
        }
    }

    /// Reads texel `(x, y)` as linear RGB. Coordinates are clamped.
    #[must_use]
    pub fn texel_rgb(&self, x: u32, y: u32) -> [f32; 3] {
        let x = x.min(self.width.saturating_sub(1)) as usize;
        let y = y.min(self.height.saturating_sub(1)) as usize;
        let comps = self.components();
        let base = (y * self.width as usize + x) * comps;

        let read = |i: usize| match &self.data {
            TexelData::Ldr(data) => f32::from(data[base + i]) / 255.0,
            TexelData::Hdr(data) => data[base + i],
        };

        if comps == 1 {
            let v = read(0);
            [v, v, v]
        } else {
            [read(0), read(1), read(2)]
        }
    }
}

#[must_use]
pub fn is_hdr_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("hdr") || e.eq_ignore_ascii_case("exr"))
}

/// Sampler addressing for a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureWrap {
    #[default]
    Repeat,
    /// Repeat horizontally, clamp vertically (equirectangular sources).
    Equirectangular,
}

impl TextureWrap {
    #[must_use]
    pub fn sampler_descriptor(self) -> wgpu::SamplerDescriptor<'static> {
        let address_mode_v = match self {
            Self::Repeat => wgpu::AddressMode::Repeat,
            Self::Equirectangular => wgpu::AddressMode::ClampToEdge,
        };
        wgpu::SamplerDescriptor {
            label: Some("Texture Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        }
    }
}

/// An uploaded 2D texture.
#[derive(Debug)]
pub struct Texture {
    gpu: GpuTexture,
    channels: u8,
    is_hdr: bool,
    wrap: TextureWrap,
}

impl Texture {
    /// Decodes `path` and uploads it.
    pub fn load(device: &DeviceRef, path: impl AsRef<Path>) -> Result<Self> {
        let image = TextureImage::load(path)?;
        Ok(Self::from_image(device, &image))
    }

    #[must_use]
    pub fn from_image(device: &DeviceRef, image: &TextureImage) -> Self {
        let gpu = GpuTexture::new(
            device,
            TextureDesc {
                label: "Texture",
                kind: TextureKind::Flat,
                width: image.width,
                height: image.height,
                format: image.format(),
            },
        );
        gpu.write(0, image.bytes());
        Self {
            gpu,
            channels: image.channels,
            is_hdr: image.is_hdr(),
            wrap: TextureWrap::Repeat,
        }
    }

    /// A depth-only render target.
    #[must_use]
    pub fn depth(device: &DeviceRef, width: u32, height: u32) -> Self {
        let gpu = GpuTexture::new(
            device,
            TextureDesc {
                label: "Shadow Map",
                kind: TextureKind::Flat,
                width,
                height,
                format: wgpu::TextureFormat::Depth32Float,
            },
        );
        Self {
            gpu,
            channels: 1,
            is_hdr: false,
            wrap: TextureWrap::Repeat,
        }
    }

    /// Switches addressing to repeat-S / clamp-T for equirectangular maps.
    pub fn set_environment_wrapping(&mut self) {
        self.wrap = TextureWrap::Equirectangular;
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> RawTextureId {
        self.gpu.id()
    }

    #[inline]
    #[must_use]
    pub fn gpu(&self) -> &GpuTexture {
        &self.gpu
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.gpu.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.gpu.height()
    }

    #[must_use]
    pub fn channels(&self) -> u8 {
        self.channels
    }

    #[must_use]
    pub fn is_hdr(&self) -> bool {
        self.is_hdr
    }

    #[must_use]
    pub fn wrap(&self) -> TextureWrap {
        self.wrap
    }
}
