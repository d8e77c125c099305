//! Meshes
//!
//! [`MeshData`] is what the external asset loader hands over: positions,
//! normals, optional texture coordinates and triangle indices. [`GpuMesh`]
//! interleaves it into [`Vertex`] records and owns the uploaded buffers.

use glam::{Vec2, Vec3};

use super::gpu::{DeviceRef, GpuBuffer};

/// Interleaved vertex as seen by every shader program.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coord: [f32; 2],
}

impl Vertex {
    #[must_use]
    pub fn new(position: Vec3, normal: Vec3, tex_coord: Vec2) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            tex_coord: tex_coord.to_array(),
        }
    }

    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    #[inline]
    #[must_use]
    pub fn normal(&self) -> Vec3 {
        Vec3::from_array(self.normal)
    }

    /// Vertex buffer layout matching the field order above.
    #[must_use]
    pub const fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
            wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// CPU-side mesh produced by the asset loader.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tex_coords: Option<Vec<Vec2>>,
    pub indices: Vec<u32>,
}

impl MeshData {
    #[must_use]
    pub fn has_tex_coords(&self) -> bool {
        self.tex_coords.is_some()
    }

    /// Interleaves the attribute streams. Missing normals default to +Y and
    /// missing texture coordinates to zero.
    #[must_use]
    pub fn vertices(&self) -> Vec<Vertex> {
        self.positions
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                let n = self.normals.get(i).copied().unwrap_or(Vec3::Y);
                let uv = self
                    .tex_coords
                    .as_ref()
                    .and_then(|uvs| uvs.get(i).copied())
                    .unwrap_or(Vec2::ZERO);
                Vertex::new(p, n, uv)
            })
            .collect()
    }

    /// Horizontal square on the XZ plane, facing +Y.
    #[must_use]
    pub fn plane(size: f32) -> Self {
        let h = size * 0.5;
        Self {
            positions: vec![
                Vec3::new(-h, 0.0, -h),
                Vec3::new(-h, 0.0, h),
                Vec3::new(h, 0.0, h),
                Vec3::new(h, 0.0, -h),
            ],
            normals: vec![Vec3::Y; 4],
            tex_coords: Some(vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(0.0, 1.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(1.0, 0.0),
            ]),
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    /// Axis-aligned cube centered on the origin with per-face normals.
    #[must_use]
    pub fn cube(size: f32) -> Self {
        let h = size * 0.5;
        let faces: [(Vec3, Vec3, Vec3); 6] = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];

        let mut mesh = Self {
            tex_coords: Some(Vec::with_capacity(24)),
            ..Self::default()
        };
        for (normal, right, up) in faces {
            let base = mesh.positions.len() as u32;
            for (u, v) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
                let corner = normal + right * (u * 2.0 - 1.0) + up * (v * 2.0 - 1.0);
                mesh.positions.push(corner * h);
                mesh.normals.push(normal);
                if let Some(uvs) = mesh.tex_coords.as_mut() {
                    uvs.push(Vec2::new(u, v));
                }
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        mesh
    }
}

/// Uploaded, drawable mesh.
#[derive(Debug)]
pub struct GpuMesh {
    vertex_buffer: GpuBuffer,
    index_buffer: GpuBuffer,
    index_count: u32,
    has_tex_coords: bool,
}

impl GpuMesh {
    #[must_use]
    pub fn upload(device: &DeviceRef, data: &MeshData) -> Self {
        let vertices = data.vertices();
        let vertex_buffer = GpuBuffer::with_data(
            device,
            "Mesh Vertices",
            bytemuck::cast_slice(&vertices),
            wgpu::BufferUsages::VERTEX,
        );
        let index_buffer = GpuBuffer::with_data(
            device,
            "Mesh Indices",
            bytemuck::cast_slice(&data.indices),
            wgpu::BufferUsages::INDEX,
        );
        Self {
            vertex_buffer,
            index_buffer,
            index_count: data.indices.len() as u32,
            has_tex_coords: data.has_tex_coords(),
        }
    }

    #[must_use]
    pub fn vertex_buffer(&self) -> &GpuBuffer {
        &self.vertex_buffer
    }

    #[must_use]
    pub fn index_buffer(&self) -> &GpuBuffer {
        &self.index_buffer
    }

    #[must_use]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    #[must_use]
    pub fn has_tex_coords(&self) -> bool {
        self.has_tex_coords
    }
}
