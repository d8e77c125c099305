//! wgpu Device
//!
//! Backs the [`GpuDevice`] seam with real `wgpu` resources. Depth cubemaps get
//! one 2D view per face so that a shadow pass can target any single face;
//! a framebuffer resolves to the texture view of its current attachment.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::gpu::{
    BufferDesc, DepthAttachment, GpuDevice, RawBufferId, RawFramebufferId, RawTextureId,
    TextureDesc, TextureKind,
};
use crate::errors::{Result, TidelightError};

struct WgpuTextureEntry {
    texture: wgpu::Texture,
    desc: TextureDesc,
    /// Full view (`D2` or `Cube`) used for sampling.
    view: wgpu::TextureView,
    /// Single-layer views used as render attachments.
    layer_views: Vec<wgpu::TextureView>,
}

#[derive(Default)]
struct WgpuState {
    next_id: u64,
    textures: FxHashMap<RawTextureId, WgpuTextureEntry>,
    framebuffers: FxHashMap<RawFramebufferId, Option<DepthAttachment>>,
    buffers: FxHashMap<RawBufferId, wgpu::Buffer>,
}

impl WgpuState {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// `wgpu`-backed device.
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    state: Mutex<WgpuState>,
}

impl WgpuDevice {
    #[must_use]
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            state: Mutex::new(WgpuState::default()),
        }
    }

    /// Requests an adapter without a surface and creates a device on it.
    pub async fn request(power_preference: wgpu::PowerPreference) -> Result<Self> {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| TidelightError::AdapterRequestFailed(e.to_string()))?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Tidelight Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
                ..Default::default()
            })
            .await?;

        Ok(Self::new(device, queue))
    }

    /// Blocking variant of [`WgpuDevice::request`].
    pub fn request_blocking(power_preference: wgpu::PowerPreference) -> Result<Self> {
        pollster::block_on(Self::request(power_preference))
    }

    #[must_use]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    #[must_use]
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Sampling view of a texture (`Cube` dimension for cubemaps).
    #[must_use]
    pub fn texture_view(&self, id: RawTextureId) -> Option<wgpu::TextureView> {
        self.state.lock().textures.get(&id).map(|e| e.view.clone())
    }

    /// Depth view a framebuffer currently renders into.
    ///
    /// A whole-cube attachment has no single render view; callers attach a
    /// face before rendering.
    #[must_use]
    pub fn framebuffer_depth_view(&self, id: RawFramebufferId) -> Option<wgpu::TextureView> {
        let state = self.state.lock();
        let attachment = (*state.framebuffers.get(&id)?)?;
        let entry = state.textures.get(&attachment.texture())?;
        match attachment {
            DepthAttachment::Flat(_) => entry.layer_views.first().cloned(),
            DepthAttachment::CubeFace(_, face) => entry.layer_views.get(face.index()).cloned(),
            DepthAttachment::WholeCube(_) => None,
        }
    }

    #[must_use]
    pub fn buffer(&self, id: RawBufferId) -> Option<wgpu::Buffer> {
        self.state.lock().buffers.get(&id).cloned()
    }
}

impl std::fmt::Debug for WgpuDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("WgpuDevice")
            .field("textures", &state.textures.len())
            .field("framebuffers", &state.framebuffers.len())
            .field("buffers", &state.buffers.len())
            .finish_non_exhaustive()
    }
}

impl GpuDevice for WgpuDevice {
    fn create_texture(&self, desc: &TextureDesc) -> RawTextureId {
        let layers = desc.kind.layer_count();
        let usage = if desc.format.is_depth_stencil_format() {
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::RENDER_ATTACHMENT
        } else {
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST
        };

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(desc.label),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: layers,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: desc.format,
            usage,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(desc.label),
            dimension: Some(match desc.kind {
                TextureKind::Flat => wgpu::TextureViewDimension::D2,
                TextureKind::Cube => wgpu::TextureViewDimension::Cube,
            }),
            ..Default::default()
        });

        let layer_views = (0..layers)
            .map(|layer| {
                texture.create_view(&wgpu::TextureViewDescriptor {
                    label: Some(desc.label),
                    dimension: Some(wgpu::TextureViewDimension::D2),
                    base_array_layer: layer,
                    array_layer_count: Some(1),
                    ..Default::default()
                })
            })
            .collect();

        let mut state = self.state.lock();
        let id = RawTextureId(state.allocate_id());
        state.textures.insert(
            id,
            WgpuTextureEntry {
                texture,
                desc: *desc,
                view,
                layer_views,
            },
        );
        id
    }

    fn write_texture(&self, id: RawTextureId, layer: u32, bytes: &[u8]) {
        let state = self.state.lock();
        let Some(entry) = state.textures.get(&id) else {
            log::warn!("write_texture: unknown texture {id:?}");
            return;
        };
        let desc = entry.desc;
        let texel = desc.format.block_copy_size(None).unwrap_or(4);

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &entry.texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: 0,
                    y: 0,
                    z: layer,
                },
                aspect: wgpu::TextureAspect::All,
            },
            bytes,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(desc.width * texel),
                rows_per_image: Some(desc.height),
            },
            wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
        );
    }

    fn destroy_texture(&self, id: RawTextureId) {
        match self.state.lock().textures.remove(&id) {
            Some(entry) => entry.texture.destroy(),
            None => log::warn!("destroy_texture: {id:?} is not live"),
        }
    }

    fn create_framebuffer(&self, label: &'static str) -> RawFramebufferId {
        let mut state = self.state.lock();
        let id = RawFramebufferId(state.allocate_id());
        state.framebuffers.insert(id, None);
        log::trace!("Created framebuffer '{label}' -> {id:?}");
        id
    }

    fn attach_depth(&self, framebuffer: RawFramebufferId, attachment: DepthAttachment) {
        let mut state = self.state.lock();
        match state.framebuffers.get_mut(&framebuffer) {
            Some(slot) => *slot = Some(attachment),
            None => log::warn!("attach_depth: unknown framebuffer {framebuffer:?}"),
        }
    }

    fn destroy_framebuffer(&self, framebuffer: RawFramebufferId) {
        if self.state.lock().framebuffers.remove(&framebuffer).is_none() {
            log::warn!("destroy_framebuffer: {framebuffer:?} is not live");
        }
    }

    fn create_buffer(&self, desc: &BufferDesc) -> RawBufferId {
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(desc.label),
            size: desc.size,
            usage: desc.usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let mut state = self.state.lock();
        let id = RawBufferId(state.allocate_id());
        state.buffers.insert(id, buffer);
        id
    }

    fn write_buffer(&self, id: RawBufferId, offset: u64, bytes: &[u8]) {
        let state = self.state.lock();
        match state.buffers.get(&id) {
            Some(buffer) => self.queue.write_buffer(buffer, offset, bytes),
            None => log::warn!("write_buffer: unknown buffer {id:?}"),
        }
    }

    fn destroy_buffer(&self, id: RawBufferId) {
        match self.state.lock().buffers.remove(&id) {
            Some(buffer) => buffer.destroy(),
            None => log::warn!("destroy_buffer: {id:?} is not live"),
        }
    }
}
