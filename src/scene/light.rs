//! Lights
//!
//! A [`Light`] eagerly owns both shadow targets: a 2D depth texture for
//! spot shadows and a depth cubemap for point shadows, each with its own
//! framebuffer. Switching [`LightType`] at runtime therefore never allocates.
//!
//! The shadow range keeps `far >= near + SHADOW_RANGE_MARGIN` under any
//! sequence of setter calls.

use glam::{Mat4, Vec3};

use crate::resources::cubemap::Cubemap;
use crate::resources::gpu::{
    CubeFace, DepthAttachment, DeviceRef, GpuFramebuffer, RawFramebufferId, RawTextureId,
};
use crate::resources::texture::Texture;

/// Resolution of the 2D shadow map.
pub const SHADOW_MAP_SIZE: u32 = 1024;
/// Face resolution of the shadow cubemap.
pub const SHADOW_CUBEMAP_SIZE: u32 = 512;

pub const DEFAULT_SHADOW_NEAR: f32 = 0.1;
pub const DEFAULT_SHADOW_FAR: f32 = 50.0;
pub const MIN_SHADOW_NEAR: f32 = 0.01;
pub const MAX_SHADOW_NEAR: f32 = 1.0e6;
/// Minimum gap between the shadow near and far planes.
pub const SHADOW_RANGE_MARGIN: f32 = 0.05;

pub const MIN_SPOT_FOV_DEGREES: f32 = 5.0;
pub const MAX_SPOT_FOV_DEGREES: f32 = 170.0;
pub const DEFAULT_SPOT_FOV_DEGREES: f32 = 45.0;

/// Lengths below this count as degenerate.
const DEGENERATE_LENGTH: f32 = 0.001;

/// Smallest far plane whose f32 distance from `near` is at least
/// [`SHADOW_RANGE_MARGIN`].
fn min_far_plane(near: f32) -> f32 {
    let mut far = near + SHADOW_RANGE_MARGIN;
    while far - near < SHADOW_RANGE_MARGIN {
        far = far.next_up();
    }
    far
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LightType {
    #[default]
    Point = 0,
    Spot = 1,
}

impl LightType {
    /// Value of the `lightType` shader uniform.
    #[must_use]
    pub const fn shader_id(self) -> i32 {
        self as i32
    }
}

/// A shadow-casting light.
///
/// Not `Clone`: the shadow targets are exclusively owned and released when
/// the light is dropped.
#[derive(Debug)]
pub struct Light {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub light_type: LightType,

    spot_fov: f32,
    target: Vec3,
    shadow_near: f32,
    shadow_far: f32,

    light_space_matrix: Mat4,
    shadow_transforms: [Mat4; 6],

    device: DeviceRef,
    shadow_map: Option<Texture>,
    shadow_cubemap: Option<Cubemap>,
    shadow_framebuffer: Option<GpuFramebuffer>,
    cubemap_framebuffer: Option<GpuFramebuffer>,
}

impl Light {
    /// Creates a light aimed straight down, with both shadow targets allocated.
    #[must_use]
    pub fn new(
        device: &DeviceRef,
        position: Vec3,
        color: Vec3,
        intensity: f32,
        light_type: LightType,
    ) -> Self {
        let mut light = Self {
            position,
            color,
            intensity,
            light_type,
            spot_fov: DEFAULT_SPOT_FOV_DEGREES.to_radians(),
            target: position + Vec3::NEG_Y,
            shadow_near: DEFAULT_SHADOW_NEAR,
            shadow_far: DEFAULT_SHADOW_FAR,
            light_space_matrix: Mat4::IDENTITY,
            shadow_transforms: [Mat4::IDENTITY; 6],
            device: DeviceRef::clone(device),
            shadow_map: Some(Texture::depth(device, SHADOW_MAP_SIZE, SHADOW_MAP_SIZE)),
            shadow_cubemap: Some(Cubemap::depth(device, SHADOW_CUBEMAP_SIZE)),
            shadow_framebuffer: None,
            cubemap_framebuffer: None,
        };
        light.initialize_shadow_resources();
        light
    }

    #[must_use]
    pub fn point(device: &DeviceRef, position: Vec3, color: Vec3, intensity: f32) -> Self {
        Self::new(device, position, color, intensity, LightType::Point)
    }

    #[must_use]
    pub fn spot(device: &DeviceRef, position: Vec3, color: Vec3, intensity: f32) -> Self {
        Self::new(device, position, color, intensity, LightType::Spot)
    }

    // ========================================================================
    // Shadow Resources
    // ========================================================================

    /// Recreates both framebuffers and attaches the current depth targets.
    ///
    /// The 2D map is attached as a flat depth target; the cubemap is attached
    /// whole, with per-face attachment left to the shadow pass. Safe to call
    /// repeatedly; previous framebuffers are released.
    pub fn initialize_shadow_resources(&mut self) {
        self.shadow_framebuffer = None;
        self.cubemap_framebuffer = None;

        let mut flat = GpuFramebuffer::new(&self.device, "Shadow Map FBO");
        if let Some(map) = &self.shadow_map {
            flat.attach_depth(DepthAttachment::Flat(map.id()));
        }

        let mut cube = GpuFramebuffer::new(&self.device, "Shadow Cubemap FBO");
        if let Some(cubemap) = &self.shadow_cubemap {
            cube.attach_depth(DepthAttachment::WholeCube(cubemap.id()));
        }

        self.shadow_framebuffer = Some(flat);
        self.cubemap_framebuffer = Some(cube);
    }

    /// Replaces the 2D depth target and rebuilds the framebuffers.
    pub fn set_shadow_map(&mut self, shadow_map: Option<Texture>) {
        self.shadow_map = shadow_map;
        self.initialize_shadow_resources();
    }

    /// Replaces the depth cubemap and rebuilds the framebuffers.
    pub fn set_shadow_cubemap(&mut self, cubemap: Option<Cubemap>) {
        self.shadow_cubemap = cubemap;
        self.initialize_shadow_resources();
    }

    #[must_use]
    pub fn shadow_map(&self) -> Option<&Texture> {
        self.shadow_map.as_ref()
    }

    #[must_use]
    pub fn shadow_cubemap(&self) -> Option<&Cubemap> {
        self.shadow_cubemap.as_ref()
    }

    #[must_use]
    pub fn shadow_map_id(&self) -> Option<RawTextureId> {
        self.shadow_map.as_ref().map(Texture::id)
    }

    #[must_use]
    pub fn shadow_cubemap_id(&self) -> Option<RawTextureId> {
        self.shadow_cubemap.as_ref().map(Cubemap::id)
    }

    #[must_use]
    pub fn shadow_framebuffer(&self) -> Option<&GpuFramebuffer> {
        self.shadow_framebuffer.as_ref()
    }

    #[must_use]
    pub fn cubemap_framebuffer(&self) -> Option<&GpuFramebuffer> {
        self.cubemap_framebuffer.as_ref()
    }

    /// Framebuffer and attachment for rendering the 2D shadow map.
    #[must_use]
    pub fn spot_target(&self) -> Option<(RawFramebufferId, DepthAttachment)> {
        let map = self.shadow_map.as_ref()?;
        let fb = self.shadow_framebuffer.as_ref()?;
        Some((fb.id(), DepthAttachment::Flat(map.id())))
    }

    /// Framebuffer of the cubemap target, if both resources exist.
    #[must_use]
    pub fn cube_target(&self) -> Option<RawFramebufferId> {
        self.shadow_cubemap.as_ref()?;
        self.cubemap_framebuffer.as_ref().map(GpuFramebuffer::id)
    }

    /// Points the cubemap framebuffer at one face.
    pub fn attach_cube_face(&mut self, face: CubeFace) -> Option<(RawFramebufferId, DepthAttachment)> {
        let cubemap_id = self.shadow_cubemap.as_ref()?.id();
        let fb = self.cubemap_framebuffer.as_mut()?;
        let attachment = DepthAttachment::CubeFace(cubemap_id, face);
        fb.attach_depth(attachment);
        Some((fb.id(), attachment))
    }

    // ========================================================================
    // Shadow Range & Spot Cone
    // ========================================================================

    #[must_use]
    pub fn shadow_near_plane(&self) -> f32 {
        self.shadow_near
    }

    #[must_use]
    pub fn shadow_far_plane(&self) -> f32 {
        self.shadow_far
    }

    /// Clamps to `[MIN_SHADOW_NEAR, MAX_SHADOW_NEAR]` and pushes the far
    /// plane out if needed. NaN maps to the minimum.
    pub fn set_shadow_near_plane(&mut self, near: f32) {
        self.shadow_near = near.max(MIN_SHADOW_NEAR).min(MAX_SHADOW_NEAR);
        let min_far = min_far_plane(self.shadow_near);
        if self.shadow_far < min_far {
            self.shadow_far = min_far;
        }
    }

    /// Clamps to at least `near + SHADOW_RANGE_MARGIN`.
    pub fn set_shadow_far_plane(&mut self, far: f32) {
        self.shadow_far = far.max(min_far_plane(self.shadow_near));
    }

    pub fn set_shadow_range(&mut self, near: f32, far: f32) {
        self.set_shadow_near_plane(near);
        self.set_shadow_far_plane(far);
    }

    /// Full spot cone angle in radians.
    #[must_use]
    pub fn spot_fov(&self) -> f32 {
        self.spot_fov
    }

    /// Clamps to `[5°, 170°]`. NaN is ignored.
    pub fn set_spot_fov(&mut self, radians: f32) {
        if radians.is_nan() {
            log::warn!("Ignoring NaN spot light FOV");
            return;
        }
        self.spot_fov = radians.clamp(
            MIN_SPOT_FOV_DEGREES.to_radians(),
            MAX_SPOT_FOV_DEGREES.to_radians(),
        );
    }

    /// Cosine of the half cone angle, as compared in the shader.
    #[must_use]
    pub fn spot_cos_cutoff(&self) -> f32 {
        (self.spot_fov * 0.5).cos()
    }

    // ========================================================================
    // Aim
    // ========================================================================

    #[must_use]
    pub fn look_at_target(&self) -> Vec3 {
        self.target
    }

    /// A target on top of the light falls back to straight down.
    pub fn set_look_at_target(&mut self, target: Vec3) {
        self.target = if (target - self.position).length() < DEGENERATE_LENGTH {
            self.position + Vec3::NEG_Y
        } else {
            target
        };
    }

    /// Unit vector from the light toward its target, or -Y when degenerate.
    #[must_use]
    pub fn direction(&self) -> Vec3 {
        let dir = self.target - self.position;
        if dir.length() < DEGENERATE_LENGTH {
            Vec3::NEG_Y
        } else {
            dir.normalize()
        }
    }

    /// Aims along `direction`. Near-zero vectors are ignored.
    pub fn set_direction(&mut self, direction: Vec3) {
        if direction.length() < DEGENERATE_LENGTH {
            return;
        }
        self.target = self.position + direction.normalize();
    }

    // ========================================================================
    // Shadow Matrices
    // ========================================================================

    #[must_use]
    pub fn light_space_matrix(&self) -> Mat4 {
        self.light_space_matrix
    }

    pub fn set_light_space_matrix(&mut self, matrix: Mat4) {
        self.light_space_matrix = matrix;
    }

    /// Cube-face view-projections in [`CubeFace`] order.
    #[must_use]
    pub fn shadow_transforms(&self) -> &[Mat4; 6] {
        &self.shadow_transforms
    }

    pub fn set_shadow_transforms(&mut self, transforms: [Mat4; 6]) {
        self.shadow_transforms = transforms;
    }
}
