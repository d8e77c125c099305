//! GPU Resource Seam
//!
//! The renderer core never talks to a graphics API directly. Every GPU
//! allocation goes through the [`GpuDevice`] trait, and every allocation is
//! wrapped in an exclusively-owned handle ([`GpuTexture`], [`GpuFramebuffer`],
//! [`GpuBuffer`]) that releases the resource exactly once when dropped.
//!
//! Handles are deliberately not `Clone`. Moving a handle transfers the
//! resource; the moved-from binding is statically unusable, so a light or
//! water surface that is reassigned can never double-free its targets.
//!
//! Two devices implement the trait:
//! - [`HeadlessDevice`](super::headless::HeadlessDevice): CPU bookkeeping, used by tests and tools.
//! - [`WgpuDevice`](super::wgpu_device::WgpuDevice): real `wgpu` resources.

use std::fmt;
use std::sync::Arc;

// ============================================================================
// Raw Identifiers
// ============================================================================

/// Device-local identifier of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawTextureId(pub u64);

/// Device-local identifier of a framebuffer (a depth render target binding).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawFramebufferId(pub u64);

/// Device-local identifier of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawBufferId(pub u64);

// ============================================================================
// Descriptors
// ============================================================================

/// Whether a texture has one layer or six cube faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Flat,
    Cube,
}

impl TextureKind {
    #[must_use]
    pub const fn layer_count(self) -> u32 {
        match self {
            Self::Flat => 1,
            Self::Cube => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureDesc {
    pub label: &'static str,
    pub kind: TextureKind,
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
}

impl TextureDesc {
    /// Size in bytes of one layer, assuming tightly packed rows.
    #[must_use]
    pub fn layer_size(&self) -> usize {
        let texel = self.format.block_copy_size(None).unwrap_or(4);
        (self.width * self.height * texel) as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferDesc {
    pub label: &'static str,
    pub size: u64,
    pub usage: wgpu::BufferUsages,
}

/// Cube faces in the conventional layer order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PositiveX = 0,
    NegativeX = 1,
    PositiveY = 2,
    NegativeY = 3,
    PositiveZ = 4,
    NegativeZ = 5,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        Self::PositiveX,
        Self::NegativeX,
        Self::PositiveY,
        Self::NegativeY,
        Self::PositiveZ,
        Self::NegativeZ,
    ];

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Axis the face looks along.
    #[must_use]
    pub const fn direction(self) -> glam::Vec3 {
        match self {
            Self::PositiveX => glam::Vec3::X,
            Self::NegativeX => glam::Vec3::NEG_X,
            Self::PositiveY => glam::Vec3::Y,
            Self::NegativeY => glam::Vec3::NEG_Y,
            Self::PositiveZ => glam::Vec3::Z,
            Self::NegativeZ => glam::Vec3::NEG_Z,
        }
    }

    /// Up vector of the face view. The ±Y faces use ±Z to stay non-degenerate.
    #[must_use]
    pub const fn up(self) -> glam::Vec3 {
        match self {
            Self::PositiveY => glam::Vec3::Z,
            Self::NegativeY => glam::Vec3::NEG_Z,
            _ => glam::Vec3::NEG_Y,
        }
    }
}

/// What a framebuffer renders depth into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthAttachment {
    /// A single-layer depth texture.
    Flat(RawTextureId),
    /// A whole depth cubemap; a face is selected later per pass.
    WholeCube(RawTextureId),
    /// One face of a depth cubemap.
    CubeFace(RawTextureId, CubeFace),
}

impl DepthAttachment {
    #[must_use]
    pub const fn texture(self) -> RawTextureId {
        match self {
            Self::Flat(id) | Self::WholeCube(id) | Self::CubeFace(id, _) => id,
        }
    }
}

// ============================================================================
// Device Trait
// ============================================================================

/// Resource-lifetime operations of the graphics layer.
///
/// Implementations use interior mutability so a single device can be shared
/// as `Arc<dyn GpuDevice>` by every resource owner.
pub trait GpuDevice: fmt::Debug + Send + Sync {
    fn create_texture(&self, desc: &TextureDesc) -> RawTextureId;
    /// Uploads tightly packed texel data to one layer (cube face) of a texture.
    fn write_texture(&self, id: RawTextureId, layer: u32, bytes: &[u8]);
    fn destroy_texture(&self, id: RawTextureId);

    fn create_framebuffer(&self, label: &'static str) -> RawFramebufferId;
    fn attach_depth(&self, framebuffer: RawFramebufferId, attachment: DepthAttachment);
    fn destroy_framebuffer(&self, framebuffer: RawFramebufferId);

    fn create_buffer(&self, desc: &BufferDesc) -> RawBufferId;
    fn write_buffer(&self, id: RawBufferId, offset: u64, bytes: &[u8]);
    fn destroy_buffer(&self, id: RawBufferId);
}

/// Shared device handle.
pub type DeviceRef = Arc<dyn GpuDevice>;

// ============================================================================
// Owned Handles
// ============================================================================

/// Exclusively-owned texture. Released on drop.
pub struct GpuTexture {
    id: RawTextureId,
    desc: TextureDesc,
    device: DeviceRef,
}

impl GpuTexture {
    #[must_use]
    pub fn new(device: &DeviceRef, desc: TextureDesc) -> Self {
        let id = device.create_texture(&desc);
        log::debug!(
            "Created texture '{}' {:?} {}x{} -> {:?}",
            desc.label,
            desc.kind,
            desc.width,
            desc.height,
            id
        );
        Self {
            id,
            desc,
            device: Arc::clone(device),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> RawTextureId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.desc.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.desc.height
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> TextureKind {
        self.desc.kind
    }

    pub fn write(&self, layer: u32, bytes: &[u8]) {
        self.device.write_texture(self.id, layer, bytes);
    }
}

impl Drop for GpuTexture {
    fn drop(&mut self) {
        self.device.destroy_texture(self.id);
    }
}

impl fmt::Debug for GpuTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuTexture")
            .field("id", &self.id)
            .field("desc", &self.desc)
            .finish_non_exhaustive()
    }
}

/// Exclusively-owned depth render target binding. Released on drop.
pub struct GpuFramebuffer {
    id: RawFramebufferId,
    attachment: Option<DepthAttachment>,
    device: DeviceRef,
}

impl GpuFramebuffer {
    #[must_use]
    pub fn new(device: &DeviceRef, label: &'static str) -> Self {
        let id = device.create_framebuffer(label);
        Self {
            id,
            attachment: None,
            device: Arc::clone(device),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> RawFramebufferId {
        self.id
    }

    /// The attachment made at setup time.
    #[inline]
    #[must_use]
    pub fn attachment(&self) -> Option<DepthAttachment> {
        self.attachment
    }

    pub fn attach_depth(&mut self, attachment: DepthAttachment) {
        self.device.attach_depth(self.id, attachment);
        self.attachment = Some(attachment);
    }
}

impl Drop for GpuFramebuffer {
    fn drop(&mut self) {
        self.device.destroy_framebuffer(self.id);
    }
}

impl fmt::Debug for GpuFramebuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuFramebuffer")
            .field("id", &self.id)
            .field("attachment", &self.attachment)
            .finish_non_exhaustive()
    }
}

/// Exclusively-owned GPU buffer. Released on drop.
pub struct GpuBuffer {
    id: RawBufferId,
    desc: BufferDesc,
    device: DeviceRef,
}

impl GpuBuffer {
    #[must_use]
    pub fn new(device: &DeviceRef, desc: BufferDesc) -> Self {
        let id = device.create_buffer(&desc);
        Self {
            id,
            desc,
            device: Arc::clone(device),
        }
    }

    /// Creates a buffer sized for `data` and uploads it.
    #[must_use]
    pub fn with_data(
        device: &DeviceRef,
        label: &'static str,
        data: &[u8],
        usage: wgpu::BufferUsages,
    ) -> Self {
        let buffer = Self::new(
            device,
            BufferDesc {
                label,
                size: data.len() as u64,
                usage: usage | wgpu::BufferUsages::COPY_DST,
            },
        );
        buffer.write(0, data);
        buffer
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> RawBufferId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> u64 {
        self.desc.size
    }

    pub fn write(&self, offset: u64, bytes: &[u8]) {
        self.device.write_buffer(self.id, offset, bytes);
    }
}

impl Drop for GpuBuffer {
    fn drop(&mut self) {
        self.device.destroy_buffer(self.id);
    }
}

impl fmt::Debug for GpuBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuBuffer")
            .field("id", &self.id)
            .field("desc", &self.desc)
            .finish_non_exhaustive()
    }
}
