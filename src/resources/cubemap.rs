//! Cubemaps
//!
//! Two kinds of cubemap live here:
//! - depth cubemaps, the render targets of omnidirectional shadows;
//! - environment cubemaps, projected from an equirectangular HDR image.
//!
//! The equirectangular projection captures each face with a 90° square
//! frustum from the origin. Every face texel is unprojected through the
//! inverse capture view-projection to a direction, which is then mapped to
//! spherical coordinates and sampled bilinearly from the source image.

use std::f32::consts::PI;

use glam::{Mat4, Vec3, Vec4};

use super::gpu::{CubeFace, DeviceRef, GpuBuffer, GpuTexture, RawBufferId, RawTextureId};
use super::gpu::{TextureDesc, TextureKind};
use super::texture::TextureImage;
use crate::errors::{Result, TidelightError};

/// Default environment cubemap face size.
pub const DEFAULT_ENVIRONMENT_RESOLUTION: u32 = 512;

/// Capture frustum used for the equirectangular projection.
pub const CAPTURE_NEAR: f32 = 0.1;
pub const CAPTURE_FAR: f32 = 10.0;

/// Six-faced texture.
#[derive(Debug)]
pub struct Cubemap {
    gpu: GpuTexture,
    resolution: u32,
}

impl Cubemap {
    /// Allocates a depth cubemap for omnidirectional shadows.
    #[must_use]
    pub fn depth(device: &DeviceRef, resolution: u32) -> Self {
        let gpu = GpuTexture::new(
            device,
            TextureDesc {
                label: "Shadow Cubemap",
                kind: TextureKind::Cube,
                width: resolution,
                height: resolution,
                format: wgpu::TextureFormat::Depth32Float,
            },
        );
        Self { gpu, resolution }
    }

    /// Projects an equirectangular image onto a new `resolution`² cubemap.
    pub fn from_equirectangular(
        device: &DeviceRef,
        image: &TextureImage,
        resolution: u32,
    ) -> Result<Self> {
        if resolution == 0 {
            return Err(TidelightError::InvalidCubemapSource(
                "cubemap resolution must be positive".to_string(),
            ));
        }
        if image.width == 0 || image.height == 0 {
            return Err(TidelightError::InvalidCubemapSource(
                "equirectangular image is empty".to_string(),
            ));
        }

        let gpu = GpuTexture::new(
            device,
            TextureDesc {
                label: "Environment Cubemap",
                kind: TextureKind::Cube,
                width: resolution,
                height: resolution,
                format: wgpu::TextureFormat::Rgba32Float,
            },
        );

        for face in CubeFace::ALL {
            let texels = project_equirect_face(image, face, resolution);
            gpu.write(face.index() as u32, bytemuck::cast_slice(&texels));
        }

        log::debug!("Created environment cubemap with resolution {resolution}x{resolution}");
        Ok(Self { gpu, resolution })
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

    #[inline]
    #[must_use]
    pub fn resolution(&self) -> u32 {
        self.resolution
    }
}

// ============================================================================
// Equirectangular Projection
// ============================================================================

/// View-projection of each capture face, in [`CubeFace`] order.
#[must_use]
pub fn capture_view_projections() -> [Mat4; 6] {
    let projection = Mat4::perspective_rh(90f32.to_radians(), 1.0, CAPTURE_NEAR, CAPTURE_FAR);
    CubeFace::ALL.map(|face| projection * Mat4::look_at_rh(Vec3::ZERO, face.direction(), face.up()))
}

/// Equirectangular texture coordinate of a unit direction.
#[must_use]
pub fn equirect_uv(direction: Vec3) -> (f32, f32) {
    let d = direction.normalize_or(Vec3::Z);
    let u = d.z.atan2(d.x) / (2.0 * PI) + 0.5;
    let v = d.y.clamp(-1.0, 1.0).asin() / PI + 0.5;
    (u, v)
}

/// Renders one face as RGBA `f32` texels, row 0 at the bottom.
#[must_use]
pub fn project_equirect_face(image: &TextureImage, face: CubeFace, resolution: u32) -> Vec<f32> {
    let inverse = capture_view_projections()[face.index()].inverse();
    let size = resolution as f32;
    let mut out = Vec::with_capacity((resolution * resolution * 4) as usize);

    for py in 0..resolution {
        for px in 0..resolution {
            let ndc_x = (px as f32 + 0.5) / size * 2.0 - 1.0;
            let ndc_y = (py as f32 + 0.5) / size * 2.0 - 1.0;
            let far = inverse * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
            let direction = far.truncate() / far.w;

            let (u, v) = equirect_uv(direction);
            let [r, g, b] = sample_bilinear(image, u, v);
            out.extend_from_slice(&[r, g, b, 1.0]);
        }
    }
    out
}

/// Bilinear lookup with horizontal repeat and vertical clamp.
fn sample_bilinear(image: &TextureImage, u: f32, v: f32) -> [f32; 3] {
    let w = image.width as f32;
    let h = image.height as f32;
    let x = u * w - 0.5;
    let y = (v * h - 0.5).clamp(0.0, h - 1.0);

    let x0 = x.floor();
    let y0 = y.floor();
    let tx = x - x0;
    let ty = y - y0;

    let wrap_x = |xi: f32| xi.rem_euclid(w) as u32;
    let (xa, xb) = (wrap_x(x0), wrap_x(x0 + 1.0));
    let (ya, yb) = (y0 as u32, (y0 + 1.0).min(h - 1.0) as u32);

    let c00 = image.texel_rgb(xa, ya);
    let c10 = image.texel_rgb(xb, ya);
    let c01 = image.texel_rgb(xa, yb);
    let c11 = image.texel_rgb(xb, yb);

    std::array::from_fn(|i| {
        let top = c00[i] + (c10[i] - c00[i]) * tx;
        let bottom = c01[i] + (c11[i] - c01[i]) * tx;
        top + (bottom - top) * ty
    })
}

// ============================================================================
// Skybox Geometry
// ============================================================================

/// Unit cube as 12 triangles, wound to face inward.
pub const SKYBOX_VERTICES: [[f32; 3]; 36] = [
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [-1.0, -1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, 1.0, 1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, -1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [1.0, 1.0, 1.0],
    [1.0, 1.0, -1.0],
    [1.0, -1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [-1.0, 1.0, 1.0],
    [1.0, 1.0, 1.0],
    [1.0, 1.0, 1.0],
    [1.0, -1.0, 1.0],
    [-1.0, -1.0, 1.0],
    [-1.0, 1.0, -1.0],
    [1.0, 1.0, -1.0],
    [1.0, 1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
];

/// Uploaded skybox cube.
#[derive(Debug)]
pub struct SkyboxCube {
    vertex_buffer: GpuBuffer,
}

impl SkyboxCube {
    pub const VERTEX_COUNT: u32 = 36;

    #[must_use]
    pub fn new(device: &DeviceRef) -> Self {
        let vertex_buffer = GpuBuffer::with_data(
            device,
            "Skybox Cube",
            bytemuck::cast_slice(&SKYBOX_VERTICES),
            wgpu::BufferUsages::VERTEX,
        );
        Self { vertex_buffer }
    }

    #[must_use]
    pub fn vertex_buffer(&self) -> RawBufferId {
        self.vertex_buffer.id()
    }
}
