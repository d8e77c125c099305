//! Headless Device
//!
//! A [`GpuDevice`] that keeps every resource in CPU memory. It assigns ids,
//! mirrors buffer and texture contents, records framebuffer attachments and
//! counts live resources, which makes resource ownership observable in tests.
//! Releasing an id twice is logged and counted instead of panicking.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::gpu::{
    BufferDesc, DepthAttachment, GpuDevice, RawBufferId, RawFramebufferId, RawTextureId,
    TextureDesc,
};

struct HeadlessTexture {
    desc: TextureDesc,
    layers: Vec<Vec<u8>>,
}

struct HeadlessBuffer {
    desc: BufferDesc,
    data: Vec<u8>,
    writes: usize,
}

struct HeadlessFramebuffer {
    label: &'static str,
    attachment: Option<DepthAttachment>,
}

#[derive(Default)]
struct HeadlessState {
    next_id: u64,
    textures: FxHashMap<RawTextureId, HeadlessTexture>,
    framebuffers: FxHashMap<RawFramebufferId, HeadlessFramebuffer>,
    buffers: FxHashMap<RawBufferId, HeadlessBuffer>,
    double_frees: usize,
}

impl HeadlessState {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn record_double_free(&mut self, what: &str, id: u64) {
        log::warn!("Headless device: {what} {id} released twice or never allocated");
        self.double_frees += 1;
    }
}

/// CPU-only GPU device.
#[derive(Default)]
pub struct HeadlessDevice {
    state: Mutex<HeadlessState>,
}

impl HeadlessDevice {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    #[must_use]
    pub fn live_textures(&self) -> usize {
        self.state.lock().textures.len()
    }

    #[must_use]
    pub fn live_framebuffers(&self) -> usize {
        self.state.lock().framebuffers.len()
    }

    #[must_use]
    pub fn live_buffers(&self) -> usize {
        self.state.lock().buffers.len()
    }

    /// Number of destroy calls for ids that were not live.
    #[must_use]
    pub fn double_frees(&self) -> usize {
        self.state.lock().double_frees
    }

    #[must_use]
    pub fn texture_desc(&self, id: RawTextureId) -> Option<TextureDesc> {
        self.state.lock().textures.get(&id).map(|t| t.desc)
    }

    /// Contents of one texture layer as last uploaded.
    #[must_use]
    pub fn texture_layer(&self, id: RawTextureId, layer: u32) -> Option<Vec<u8>> {
        self.state
            .lock()
            .textures
            .get(&id)
            .and_then(|t| t.layers.get(layer as usize).cloned())
    }

    #[must_use]
    pub fn buffer_contents(&self, id: RawBufferId) -> Option<Vec<u8>> {
        self.state.lock().buffers.get(&id).map(|b| b.data.clone())
    }

    #[must_use]
    pub fn buffer_desc(&self, id: RawBufferId) -> Option<BufferDesc> {
        self.state.lock().buffers.get(&id).map(|b| b.desc)
    }

    /// How many uploads a buffer has received since creation.
    #[must_use]
    pub fn buffer_write_count(&self, id: RawBufferId) -> usize {
        self.state.lock().buffers.get(&id).map_or(0, |b| b.writes)
    }

    #[must_use]
    pub fn framebuffer_attachment(&self, id: RawFramebufferId) -> Option<DepthAttachment> {
        self.state
            .lock()
            .framebuffers
            .get(&id)
            .and_then(|fb| fb.attachment)
    }
}

impl std::fmt::Debug for HeadlessDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("HeadlessDevice")
            .field("textures", &state.textures.len())
            .field("framebuffers", &state.framebuffers.len())
            .field("buffers", &state.buffers.len())
            .finish()
    }
}

impl GpuDevice for HeadlessDevice {
    fn create_texture(&self, desc: &TextureDesc) -> RawTextureId {
        let mut state = self.state.lock();
        let id = RawTextureId(state.allocate_id());
        let layers = (0..desc.kind.layer_count())
            .map(|_| vec![0u8; desc.layer_size()])
            .collect();
        state.textures.insert(id, HeadlessTexture { desc: *desc, layers });
        id
    }

    fn write_texture(&self, id: RawTextureId, layer: u32, bytes: &[u8]) {
        let mut state = self.state.lock();
        match state
            .textures
            .get_mut(&id)
            .and_then(|t| t.layers.get_mut(layer as usize))
        {
            Some(slot) => {
                slot.clear();
                slot.extend_from_slice(bytes);
            }
            None => log::warn!("Headless device: write to missing texture {id:?} layer {layer}"),
        }
    }

    fn destroy_texture(&self, id: RawTextureId) {
        let mut state = self.state.lock();
        if state.textures.remove(&id).is_none() {
            state.record_double_free("texture", id.0);
        }
    }

    fn create_framebuffer(&self, label: &'static str) -> RawFramebufferId {
        let mut state = self.state.lock();
        let id = RawFramebufferId(state.allocate_id());
        state.framebuffers.insert(
            id,
            HeadlessFramebuffer {
                label,
                attachment: None,
            },
        );
        id
    }

    fn attach_depth(&self, framebuffer: RawFramebufferId, attachment: DepthAttachment) {
        let mut state = self.state.lock();
        if !state.textures.contains_key(&attachment.texture()) {
            log::warn!("Headless device: attaching unknown texture {attachment:?}");
        }
        match state.framebuffers.get_mut(&framebuffer) {
            Some(fb) => fb.attachment = Some(attachment),
            None => log::warn!("Headless device: attach to missing framebuffer {framebuffer:?}"),
        }
    }

    fn destroy_framebuffer(&self, framebuffer: RawFramebufferId) {
        let mut state = self.state.lock();
        match state.framebuffers.remove(&framebuffer) {
            Some(fb) => log::trace!("Headless device: released framebuffer '{}'", fb.label),
            None => state.record_double_free("framebuffer", framebuffer.0),
        }
    }

    fn create_buffer(&self, desc: &BufferDesc) -> RawBufferId {
        let mut state = self.state.lock();
        let id = RawBufferId(state.allocate_id());
        state.buffers.insert(
            id,
            HeadlessBuffer {
                desc: *desc,
                data: vec![0u8; desc.size as usize],
                writes: 0,
            },
        );
        id
    }

    fn write_buffer(&self, id: RawBufferId, offset: u64, bytes: &[u8]) {
        let mut state = self.state.lock();
        let Some(buffer) = state.buffers.get_mut(&id) else {
            log::warn!("Headless device: write to missing buffer {id:?}");
            return;
        };
        let start = offset as usize;
        let end = start + bytes.len();
        if end > buffer.data.len() {
            log::warn!(
                "Headless device: write of {} bytes at {offset} overflows '{}' ({} bytes)",
                bytes.len(),
                buffer.desc.label,
                buffer.data.len()
            );
            return;
        }
        buffer.data[start..end].copy_from_slice(bytes);
        buffer.writes += 1;
    }

    fn destroy_buffer(&self, id: RawBufferId) {
        let mut state = self.state.lock();
        if state.buffers.remove(&id).is_none() {
            state.record_double_free("buffer", id.0);
        }
    }
}
