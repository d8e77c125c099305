//! Models
//!
//! A [`Model`] is a list of uploaded meshes paired 1:1 with materials, a
//! model-to-world matrix and an optional [`NodeHierarchy`]. Meshes attached
//! to a hierarchy node are drawn with `model_matrix * node_world`; unattached
//! meshes use the model matrix alone.

use glam::{Affine3A, Mat3, Mat4};

use super::hierarchy::{NodeHierarchy, NodeIndex};
use super::transform::Transform;
use crate::errors::{Result, TidelightError};
use crate::renderer::drawable::{DrawContext, Drawable};
use crate::resources::gpu::{BufferDesc, DeviceRef, GpuBuffer};
use crate::resources::material::{GpuMaterial, MATERIAL_BINDING, Material, TextureSlot};
use crate::resources::mesh::{GpuMesh, MeshData};

#[derive(Debug)]
pub struct Model {
    device: DeviceRef,
    meshes: Vec<GpuMesh>,
    materials: Vec<Material>,
    /// One uniform block per mesh.
    material_buffers: Vec<GpuBuffer>,
    mesh_nodes: Vec<Option<NodeIndex>>,
    pub model_matrix: Mat4,
    hierarchy: NodeHierarchy,
}

impl Model {
    #[must_use]
    pub fn new(device: &DeviceRef) -> Self {
        Self {
            device: device.clone(),
            meshes: Vec::new(),
            materials: Vec::new(),
            material_buffers: Vec::new(),
            mesh_nodes: Vec::new(),
            model_matrix: Mat4::IDENTITY,
            hierarchy: NodeHierarchy::new(),
        }
    }

    /// Uploads loader output. Fails unless there is exactly one material per
    /// mesh.
    pub fn from_parts(
        device: &DeviceRef,
        meshes: &[MeshData],
        materials: Vec<Material>,
    ) -> Result<Self> {
        if meshes.len() != materials.len() {
            return Err(TidelightError::MeshMaterialMismatch {
                meshes: meshes.len(),
                materials: materials.len(),
            });
        }
        let mut model = Self::new(device);
        for (mesh, material) in meshes.iter().zip(materials) {
            model.add_mesh(mesh, material);
        }
        log::debug!("Model uploaded with {} meshes", model.meshes.len());
        Ok(model)
    }

    /// Uploads `mesh` and appends it with its material. Returns the mesh index.
    pub fn add_mesh(&mut self, mesh: &MeshData, material: Material) -> usize {
        self.meshes.push(GpuMesh::upload(&self.device, mesh));
        self.materials.push(material);
        self.material_buffers.push(GpuBuffer::new(
            &self.device,
            BufferDesc {
                label: "Model Material",
                size: std::mem::size_of::<GpuMaterial>() as u64,
                usage: wgpu::BufferUsages::UNIFORM,
            },
        ));
        self.mesh_nodes.push(None);
        self.meshes.len() - 1
    }

    #[must_use]
    pub fn with_model_matrix(mut self, matrix: Mat4) -> Self {
        self.model_matrix = matrix;
        self
    }

    #[must_use]
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    #[must_use]
    pub fn meshes(&self) -> &[GpuMesh] {
        &self.meshes
    }

    #[must_use]
    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    #[must_use]
    pub fn material_mut(&mut self, index: usize) -> Option<&mut Material> {
        self.materials.get_mut(index)
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    #[must_use]
    pub fn hierarchy(&self) -> &NodeHierarchy {
        &self.hierarchy
    }

    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        local: Transform,
        parent: Option<NodeIndex>,
    ) -> Result<NodeIndex> {
        self.hierarchy.add_node(name, local, parent)
    }

    pub fn set_node_parent(&mut self, child: NodeIndex, parent: Option<NodeIndex>) -> Result<()> {
        self.hierarchy.set_parent(child, parent)
    }

    pub fn set_node_transform(&mut self, node: NodeIndex, local: Transform) -> Result<()> {
        self.hierarchy.set_local_transform(node, local)
    }

    /// Binds mesh `mesh` to hierarchy node `node`.
    pub fn attach_mesh_to_node(&mut self, mesh: usize, node: NodeIndex) -> Result<()> {
        if self.hierarchy.node(node).is_none() {
            return Err(TidelightError::InvalidNode {
                index: node.0,
                count: self.hierarchy.len(),
            });
        }
        let count = self.mesh_nodes.len();
        let slot = self
            .mesh_nodes
            .get_mut(mesh)
            .ok_or(TidelightError::InvalidNode { index: mesh, count })?;
        *slot = Some(node);
        Ok(())
    }

    /// World matrix of mesh `mesh`, including its node transform if attached.
    #[must_use]
    pub fn mesh_world_matrix(&self, mesh: usize) -> Mat4 {
        let node_world = self
            .mesh_nodes
            .get(mesh)
            .copied()
            .flatten()
            .and_then(|node| self.hierarchy.world_transform(node))
            .unwrap_or(Affine3A::IDENTITY);
        self.model_matrix * Mat4::from(node_world)
    }
}

/// Inverse-transpose of the upper 3x3, for transforming normals.
#[must_use]
pub fn normal_matrix(model: Mat4) -> Mat3 {
    Mat3::from_mat4(model).inverse().transpose()
}

impl Drawable for Model {
    fn draw(&self, ctx: &mut DrawContext<'_>, view_projection: Mat4) {
        for (i, mesh) in self.meshes.iter().enumerate() {
            let material = &self.materials[i];

            let mut bound = [false; 4];
            for slot in TextureSlot::ALL {
                let texture = material
                    .texture(slot)
                    .and_then(|handle| ctx.textures.get(handle));
                if let Some(texture) = texture {
                    ctx.recorder
                        .bind_texture(slot.unit(), slot.uniform_name(), texture.id());
                    bound[slot as usize] = true;
                }
            }

            let block = material.gpu_data(|slot| bound[slot as usize]);
            let buffer = &self.material_buffers[i];
            buffer.write(0, bytemuck::bytes_of(&block));
            ctx.recorder
                .bind_uniform_block("Material", MATERIAL_BINDING, buffer.id());

            let model = self.mesh_world_matrix(i);
            ctx.recorder.set_uniform("mvpMatrix", view_projection * model);
            ctx.recorder.set_uniform("modelMatrix", model);
            ctx.recorder.set_uniform("normalModelMatrix", normal_matrix(model));
            ctx.recorder.set_uniform("hasTexCoords", mesh.has_tex_coords());
            ctx.recorder.set_uniform("useMaterial", true);
            ctx.recorder.draw_indexed(
                mesh.vertex_buffer().id(),
                mesh.index_buffer().id(),
                mesh.index_count(),
            );
        }
    }

    fn draw_depth(&self, ctx: &mut DrawContext<'_>, light_space: Mat4) {
        for (i, mesh) in self.meshes.iter().enumerate() {
            ctx.recorder
                .set_uniform("mvpMatrix", light_space * self.mesh_world_matrix(i));
            ctx.recorder.draw_indexed(
                mesh.vertex_buffer().id(),
                mesh.index_buffer().id(),
                mesh.index_count(),
            );
        }
    }

    fn draw_depth_cubemap(&self, ctx: &mut DrawContext<'_>) {
        for (i, mesh) in self.meshes.iter().enumerate() {
            ctx.recorder
                .set_uniform("modelMatrix", self.mesh_world_matrix(i));
            ctx.recorder.draw_indexed(
                mesh.vertex_buffer().id(),
                mesh.index_buffer().id(),
                mesh.index_count(),
            );
        }
    }
}
