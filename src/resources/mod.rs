//! GPU-facing resources: device seam, textures, cubemaps, meshes, materials.

pub mod cubemap;
pub mod gpu;
pub mod headless;
pub mod material;
pub mod mesh;
pub mod texture;
pub mod wgpu_device;

pub use cubemap::{Cubemap, SkyboxCube};
pub use gpu::{
    BufferDesc, CubeFace, DepthAttachment, DeviceRef, GpuBuffer, GpuDevice, GpuFramebuffer,
    GpuTexture, RawBufferId, RawFramebufferId, RawTextureId, TextureDesc, TextureKind,
};
pub use headless::HeadlessDevice;
pub use material::{GpuMaterial, Material, TextureSlot};
pub use mesh::{GpuMesh, MeshData, Vertex};
pub use texture::{Texture, TextureHandle, TextureImage, TextureStore};
pub use wgpu_device::WgpuDevice;
