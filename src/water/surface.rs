//! Water Surface
//!
//! A heightfield grid of `resolution × resolution` quads spanning a square
//! extent around a 2D center. Heights come from [`NoiseField`] sampled in
//! world space, with time as the third noise axis, so the waves stay put in
//! the world while the grid follows the camera.
//!
//! # Update model
//!
//! - Topology (vertex count, index buffer) is regenerated only when the
//!   extent changes or the focus point drifts more than
//!   [`RECENTER_DISTANCE`] from the grid center. A rebuild allocates fresh
//!   GPU buffers.
//! - Every other frame re-samples heights and normals in place and streams
//!   the vertex buffer.

use glam::{Mat3, Mat4, Vec2, Vec3};

use super::config::WaterConfig;
use super::noise::NoiseField;
use crate::renderer::drawable::{DrawContext, Drawable};
use crate::resources::gpu::{BufferDesc, DeviceRef, GpuBuffer, RawBufferId};
use crate::resources::material::{GpuMaterial, MATERIAL_BINDING, Material};
use crate::resources::mesh::Vertex;

/// Quads per side.
pub const DEFAULT_RESOLUTION: u32 = 96;
pub const MAX_RESOLUTION: u32 = 4096;
/// Distance the focus may drift before the grid is re-centered.
pub const RECENTER_DISTANCE: f32 = 5.0;

pub const MIN_AMPLITUDE: f32 = 0.005;
pub const MIN_FREQUENCY: f32 = 0.001;
pub const MIN_EXTENT: f32 = 20.0;
pub const MAX_EXTENT: f32 = 400.0;

/// Setter changes smaller than this are ignored.
const CHANGE_EPSILON: f32 = 1e-4;

/// GPU buffers of the current topology.
#[derive(Debug)]
struct WaterGeometry {
    vertex_buffer: GpuBuffer,
    index_buffer: GpuBuffer,
    index_count: u32,
}

/// Procedural animated water heightfield.
pub struct WaterSurface {
    device: DeviceRef,
    enabled: bool,
    needs_rebuild: bool,

    center: Vec2,
    extent: f32,
    resolution: u32,

    amplitude: f32,
    frequency: f32,
    speed: f32,
    height_offset: f32,
    time: f32,

    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    heights: Vec<f32>,
    geometry: Option<WaterGeometry>,
    rebuilds: usize,

    material: Material,
    material_buffer: GpuBuffer,
    noise: NoiseField,
}

impl WaterSurface {
    #[must_use]
    pub fn new(device: &DeviceRef) -> Self {
        Self::with_resolution(device, DEFAULT_RESOLUTION)
    }

    /// Creates a surface with `resolution` quads per side, clamped to
    /// `[1, MAX_RESOLUTION]`.
    #[must_use]
    pub fn with_resolution(device: &DeviceRef, resolution: u32) -> Self {
        let material_buffer = GpuBuffer::new(
            device,
            BufferDesc {
                label: "Water Material",
                size: std::mem::size_of::<GpuMaterial>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            },
        );

        Self {
            device: DeviceRef::clone(device),
            enabled: true,
            needs_rebuild: true,
            center: Vec2::ZERO,
            extent: 120.0,
            resolution: resolution.clamp(1, MAX_RESOLUTION),
            amplitude: 0.1,
            frequency: 0.35,
            speed: 0.6,
            height_offset: -1.5,
            time: 0.0,
            vertices: Vec::new(),
            indices: Vec::new(),
            heights: Vec::new(),
            geometry: None,
            rebuilds: 0,
            material: Material::water(),
            material_buffer,
            noise: NoiseField::new(0),
        }
    }

    // ========================================================================
    // Parameters
    // ========================================================================

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Clamps to at least [`MIN_AMPLITUDE`]. Returns whether the value changed.
    pub fn set_amplitude(&mut self, value: f32) -> bool {
        update_param(&mut self.amplitude, value.max(MIN_AMPLITUDE))
    }

    /// Clamps to at least [`MIN_FREQUENCY`]. Returns whether the value changed.
    pub fn set_frequency(&mut self, value: f32) -> bool {
        update_param(&mut self.frequency, value.max(MIN_FREQUENCY))
    }

    pub fn set_speed(&mut self, value: f32) -> bool {
        update_param(&mut self.speed, value)
    }

    /// Clamps to `[MIN_EXTENT, MAX_EXTENT]`; a change schedules a rebuild.
    pub fn set_extent(&mut self, value: f32) -> bool {
        let changed = update_param(&mut self.extent, value.clamp(MIN_EXTENT, MAX_EXTENT));
        if changed {
            self.needs_rebuild = true;
        }
        changed
    }

    pub fn set_height_offset(&mut self, value: f32) -> bool {
        update_param(&mut self.height_offset, value)
    }

    /// Applies all five parameters through their setters. Returns whether
    /// any of them changed.
    pub fn configure(
        &mut self,
        amplitude: f32,
        frequency: f32,
        speed: f32,
        extent: f32,
        height_offset: f32,
    ) -> bool {
        let mut changed = self.set_amplitude(amplitude);
        changed |= self.set_frequency(frequency);
        changed |= self.set_speed(speed);
        changed |= self.set_extent(extent);
        changed |= self.set_height_offset(height_offset);
        changed
    }

    /// Applies a [`WaterConfig`], including the enabled flag.
    pub fn apply_config(&mut self, config: &WaterConfig) -> bool {
        let toggled = self.enabled != config.enabled;
        self.enabled = config.enabled;
        let changed = self.configure(
            config.amplitude,
            config.frequency,
            config.speed,
            config.extent,
            config.height_offset,
        );
        toggled || changed
    }

    /// Snapshot of the current parameters.
    #[must_use]
    pub fn config(&self) -> WaterConfig {
        WaterConfig {
            enabled: self.enabled,
            amplitude: self.amplitude,
            frequency: self.frequency,
            speed: self.speed,
            extent: self.extent,
            height_offset: self.height_offset,
        }
    }

    #[must_use]
    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    #[must_use]
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    #[must_use]
    pub fn extent(&self) -> f32 {
        self.extent
    }

    #[must_use]
    pub fn height_offset(&self) -> f32 {
        self.height_offset
    }

    #[must_use]
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.center
    }

    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[must_use]
    pub fn material(&self) -> &Material {
        &self.material
    }

    // ========================================================================
    // Geometry access
    // ========================================================================

    #[must_use]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[must_use]
    pub fn vertex_buffer_id(&self) -> Option<RawBufferId> {
        self.geometry.as_ref().map(|g| g.vertex_buffer.id())
    }

    #[must_use]
    pub fn index_buffer_id(&self) -> Option<RawBufferId> {
        self.geometry.as_ref().map(|g| g.index_buffer.id())
    }

    /// Number of full rebuilds so far.
    #[must_use]
    pub fn rebuild_count(&self) -> usize {
        self.rebuilds
    }

    /// Translation placing the grid at its center.
    #[must_use]
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(self.center.x, 0.0, self.center.y))
    }

    /// Wave height (without the height offset) at a world position.
    #[must_use]
    pub fn sample_height(&self, world_x: f32, world_z: f32) -> f32 {
        let nx = f64::from(world_x) * f64::from(self.frequency);
        let ny = f64::from(self.time) * f64::from(self.speed);
        let nz = f64::from(world_z) * f64::from(self.frequency);
        self.noise.noise(nx, ny, nz) as f32 * self.amplitude
    }

    // ========================================================================
    // Simulation
    // ========================================================================

    /// Advances the waves by `delta_time` and follows `focus` on the XZ plane.
    pub fn advance(&mut self, focus: Vec3, delta_time: f32) {
        if !self.enabled {
            return;
        }

        self.time += delta_time;

        let focus_xz = Vec2::new(focus.x, focus.z);
        if focus_xz.distance(self.center) > RECENTER_DISTANCE {
            self.center = focus_xz;
            self.needs_rebuild = true;
        }

        if self.needs_rebuild {
            self.rebuild();
        }

        self.refresh_vertices();

        if let Some(geometry) = &self.geometry {
            geometry
                .vertex_buffer
                .write(0, bytemuck::cast_slice(&self.vertices));
        }
    }

    #[inline]
    fn step(&self) -> f32 {
        self.extent / self.resolution as f32
    }

    #[inline]
    fn grid_index(&self, x: u32, z: u32) -> usize {
        z as usize * (self.resolution as usize + 1) + x as usize
    }

    /// Regenerates topology and allocates new buffers.
    fn rebuild(&mut self) {
        let res = self.resolution;
        let row = res + 1;
        let vertex_count = (row * row) as usize;

        self.vertices.clear();
        self.vertices.resize(vertex_count, Vertex::default());
        self.heights.clear();
        self.heights.resize(vertex_count, 0.0);

        self.indices.clear();
        self.indices.reserve((res * res * 6) as usize);
        for z in 0..res {
            for x in 0..res {
                let top_left = z * row + x;
                let top_right = top_left + 1;
                let bottom_left = top_left + row;
                let bottom_right = bottom_left + 1;

                self.indices.extend_from_slice(&[
                    top_left,
                    bottom_left,
                    top_right,
                    top_right,
                    bottom_left,
                    bottom_right,
                ]);
            }
        }

        let vertex_buffer = GpuBuffer::new(
            &self.device,
            BufferDesc {
                label: "Water Vertices",
                size: (vertex_count * std::mem::size_of::<Vertex>()) as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            },
        );
        let index_buffer = GpuBuffer::with_data(
            &self.device,
            "Water Indices",
            bytemuck::cast_slice(&self.indices),
            wgpu::BufferUsages::INDEX,
        );

        self.geometry = Some(WaterGeometry {
            vertex_buffer,
            index_buffer,
            index_count: self.indices.len() as u32,
        });
        self.needs_rebuild = false;
        self.rebuilds += 1;

        log::debug!(
            "Water rebuilt: {} vertices, {} indices, center ({:.2}, {:.2}), extent {:.1}",
            vertex_count,
            self.indices.len(),
            self.center.x,
            self.center.y,
            self.extent
        );
    }

    /// Re-samples heights, positions, texture coordinates and normals.
    fn refresh_vertices(&mut self) {
        let res = self.resolution;
        let step = self.step();
        let half = 0.5 * self.extent;

        for z in 0..=res {
            for x in 0..=res {
                let idx = self.grid_index(x, z);
                let local_x = -half + step * x as f32;
                let local_z = -half + step * z as f32;

                let height = self.sample_height(self.center.x + local_x, self.center.y + local_z);
                self.heights[idx] = height;

                let vertex = &mut self.vertices[idx];
                vertex.position = [local_x, height + self.height_offset, local_z];
                vertex.tex_coord = [x as f32 / res as f32, z as f32 / res as f32];
            }
        }

        for z in 0..=res {
            for x in 0..=res {
                let normal = self.compute_normal(x, z, step);
                let idx = self.grid_index(x, z);
                self.vertices[idx].normal = normal.to_array();
            }
        }
    }

    /// Central difference over the clamped 4-neighborhood.
    fn compute_normal(&self, x: u32, z: u32, step: f32) -> Vec3 {
        let res = self.resolution;
        let height = |xi: u32, zi: u32| self.heights[self.grid_index(xi.min(res), zi.min(res))];

        let h_left = height(x.saturating_sub(1), z);
        let h_right = height(x + 1, z);
        let h_down = height(x, z.saturating_sub(1));
        let h_up = height(x, z + 1);

        Vec3::new(-(h_right - h_left), 2.0 * step, -(h_up - h_down)).normalize()
    }

    // ========================================================================
    // Drawing
    // ========================================================================

    /// Environment pass variant; identical to [`Drawable::draw`].
    pub fn draw_environment(&self, ctx: &mut DrawContext<'_>, view_projection: Mat4) {
        self.draw(ctx, view_projection);
    }

    fn drawable_geometry(&self) -> Option<&WaterGeometry> {
        if self.enabled { self.geometry.as_ref() } else { None }
    }
}

impl std::fmt::Debug for WaterSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaterSurface")
            .field("enabled", &self.enabled)
            .field("center", &self.center)
            .field("extent", &self.extent)
            .field("resolution", &self.resolution)
            .field("time", &self.time)
            .field("geometry", &self.geometry)
            .finish_non_exhaustive()
    }
}

impl Drawable for WaterSurface {
    fn draw(&self, ctx: &mut DrawContext<'_>, view_projection: Mat4) {
        let Some(geometry) = self.drawable_geometry() else {
            return;
        };

        let block = self.material.gpu_data(|_| false);
        self.material_buffer.write(0, bytemuck::bytes_of(&block));
        ctx.recorder
            .bind_uniform_block("Material", MATERIAL_BINDING, self.material_buffer.id());

        let model = self.model_matrix();
        ctx.recorder.set_uniform("mvpMatrix", view_projection * model);
        ctx.recorder.set_uniform("modelMatrix", model);
        ctx.recorder.set_uniform("normalModelMatrix", Mat3::IDENTITY);
        ctx.recorder.set_uniform("hasTexCoords", true);
        ctx.recorder.set_uniform("useMaterial", true);
        ctx.recorder.draw_indexed(
            geometry.vertex_buffer.id(),
            geometry.index_buffer.id(),
            geometry.index_count,
        );
    }

    fn draw_depth(&self, ctx: &mut DrawContext<'_>, light_space: Mat4) {
        let Some(geometry) = self.drawable_geometry() else {
            return;
        };
        ctx.recorder
            .set_uniform("mvpMatrix", light_space * self.model_matrix());
        ctx.recorder.draw_indexed(
            geometry.vertex_buffer.id(),
            geometry.index_buffer.id(),
            geometry.index_count,
        );
    }

    fn draw_depth_cubemap(&self, ctx: &mut DrawContext<'_>) {
        let Some(geometry) = self.drawable_geometry() else {
            return;
        };
        ctx.recorder.set_uniform("modelMatrix", self.model_matrix());
        ctx.recorder.draw_indexed(
            geometry.vertex_buffer.id(),
            geometry.index_buffer.id(),
            geometry.index_count,
        );
    }
}

/// Stores `value` unless it is within [`CHANGE_EPSILON`] of the current one.
fn update_param(slot: &mut f32, value: f32) -> bool {
    if (value - *slot).abs() < CHANGE_EPSILON {
        return false;
    }
    *slot = value;
    true
}
