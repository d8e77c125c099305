//! Scene
//!
//! Owns models, lights, cameras, the texture store, the optional environment
//! cubemap and the optional water surface, and exposes the four per-frame
//! entry points the render loop calls in order:
//!
//! 1. [`Scene::render_shadow_maps`]
//! 2. [`Scene::draw_skybox`]
//! 3. [`Scene::draw_environment`]
//! 4. [`Scene::draw`]
//!
//! The water surface, when present and enabled, is drawn alongside the
//! models in every pass.

use std::path::Path;

use glam::Vec3;

use super::camera::Camera;
use super::light::Light;
use super::model::Model;
use crate::errors::Result;
use crate::renderer::commands::FrameRecorder;
use crate::renderer::composer::{LightingComposer, SceneView};
use crate::renderer::drawable::Drawable;
use crate::renderer::settings::RenderSettings;
use crate::renderer::shadow::{ShadowPassDriver, ShadowPassStats};
use crate::resources::cubemap::{Cubemap, SkyboxCube};
use crate::resources::gpu::DeviceRef;
use crate::resources::texture::{Texture, TextureHandle, TextureImage, TextureStore};
use crate::water::WaterSurface;

pub const DEFAULT_ENV_BRIGHTNESS: f32 = 0.5;

pub struct Scene {
    device: DeviceRef,

    models: Vec<Model>,
    lights: Vec<Light>,
    cameras: Vec<Camera>,
    active_camera: usize,

    textures: TextureStore,
    environment: Option<Cubemap>,
    environment_source: Option<Texture>,
    pub env_brightness: f32,
    water: Option<WaterSurface>,
    skybox: SkyboxCube,

    shadow_driver: ShadowPassDriver,
    composer: LightingComposer,
}

impl Scene {
    #[must_use]
    pub fn new(device: &DeviceRef) -> Self {
        Self {
            device: device.clone(),
            models: Vec::new(),
            lights: Vec::new(),
            cameras: Vec::new(),
            active_camera: 0,
            textures: TextureStore::with_key(),
            environment: None,
            environment_source: None,
            env_brightness: DEFAULT_ENV_BRIGHTNESS,
            water: None,
            skybox: SkyboxCube::new(device),
            shadow_driver: ShadowPassDriver::new(),
            composer: LightingComposer::new(),
        }
    }

    #[must_use]
    pub fn device(&self) -> &DeviceRef {
        &self.device
    }

    // ========================================================================
    // Models, Lights & Cameras
    // ========================================================================

    pub fn add_model(&mut self, model: Model) -> usize {
        self.models.push(model);
        self.models.len() - 1
    }

    #[must_use]
    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn models_mut(&mut self) -> &mut [Model] {
        &mut self.models
    }

    pub fn add_light(&mut self, light: Light) -> usize {
        self.lights.push(light);
        self.lights.len() - 1
    }

    /// Drops the light and with it its shadow targets.
    pub fn remove_light(&mut self, index: usize) -> Option<Light> {
        (index < self.lights.len()).then(|| self.lights.remove(index))
    }

    #[must_use]
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn lights_mut(&mut self) -> &mut [Light] {
        &mut self.lights
    }

    /// Adds a camera. The first camera becomes active.
    pub fn add_camera(&mut self, camera: Camera) -> usize {
        self.cameras.push(camera);
        self.cameras.len() - 1
    }

    #[must_use]
    pub fn cameras(&self) -> &[Camera] {
        &self.cameras
    }

    /// Returns `false` and keeps the current camera when `index` is out of range.
    pub fn set_active_camera(&mut self, index: usize) -> bool {
        if index < self.cameras.len() {
            self.active_camera = index;
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn active_camera_index(&self) -> usize {
        self.active_camera
    }

    #[must_use]
    pub fn active_camera(&self) -> Option<&Camera> {
        self.cameras.get(self.active_camera)
    }

    pub fn active_camera_mut(&mut self) -> Option<&mut Camera> {
        self.cameras.get_mut(self.active_camera)
    }

    // ========================================================================
    // Textures & Environment
    // ========================================================================

    #[must_use]
    pub fn textures(&self) -> &TextureStore {
        &self.textures
    }

    pub fn insert_texture(&mut self, texture: Texture) -> TextureHandle {
        self.textures.insert(texture)
    }

    pub fn load_texture(&mut self, path: impl AsRef<Path>) -> Result<TextureHandle> {
        let texture = Texture::load(&self.device, path)?;
        Ok(self.textures.insert(texture))
    }

    /// Loads a material texture, logging and returning `None` on failure so
    /// the slot stays unbound.
    pub fn load_material_texture(&mut self, path: impl AsRef<Path>) -> Option<TextureHandle> {
        let path = path.as_ref();
        match self.load_texture(path) {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::warn!("Material texture '{}' left unbound: {e}", path.display());
                None
            }
        }
    }

    /// Replaces the environment with a cubemap projected from an
    /// equirectangular image. On failure the previous environment stays.
    pub fn set_environment_map(&mut self, path: impl AsRef<Path>, resolution: u32) -> Result<()> {
        let path = path.as_ref();
        let image = TextureImage::load(path)?;
        let cubemap = Cubemap::from_equirectangular(&self.device, &image, resolution)?;

        let mut source = Texture::from_image(&self.device, &image);
        source.set_environment_wrapping();

        self.environment = Some(cubemap);
        self.environment_source = Some(source);
        log::info!(
            "Environment map '{}' loaded at {resolution}x{resolution}",
            path.display()
        );
        Ok(())
    }

    pub fn set_environment(&mut self, cubemap: Option<Cubemap>) {
        self.environment = cubemap;
        self.environment_source = None;
    }

    #[must_use]
    pub fn environment(&self) -> Option<&Cubemap> {
        self.environment.as_ref()
    }

    /// The equirectangular texture the environment was projected from.
    #[must_use]
    pub fn environment_source(&self) -> Option<&Texture> {
        self.environment_source.as_ref()
    }

    // ========================================================================
    // Water
    // ========================================================================

    pub fn set_water(&mut self, water: Option<WaterSurface>) {
        self.water = water;
    }

    #[must_use]
    pub fn water(&self) -> Option<&WaterSurface> {
        self.water.as_ref()
    }

    pub fn water_mut(&mut self) -> Option<&mut WaterSurface> {
        self.water.as_mut()
    }

    /// Steps the water surface toward `focus`.
    pub fn advance_water(&mut self, focus: Vec3, delta_time: f32) {
        if let Some(water) = &mut self.water {
            water.advance(focus, delta_time);
        }
    }

    // ========================================================================
    // Frame Passes
    // ========================================================================

    pub fn render_shadow_maps(
        &mut self,
        recorder: &mut FrameRecorder,
        settings: &RenderSettings,
    ) -> ShadowPassStats {
        let drawables = collect_drawables(&self.models, self.water.as_ref());
        self.shadow_driver.render(
            recorder,
            &self.textures,
            &mut self.lights,
            &drawables,
            settings,
        )
    }

    pub fn draw_skybox(&self, recorder: &mut FrameRecorder) -> bool {
        let drawables = collect_drawables(&self.models, self.water.as_ref());
        self.composer
            .draw_skybox(recorder, &self.view(&drawables), &self.skybox)
    }

    pub fn draw_environment(&self, recorder: &mut FrameRecorder, settings: &RenderSettings) -> bool {
        let drawables = collect_drawables(&self.models, self.water.as_ref());
        self.composer
            .draw_environment(recorder, &self.view(&drawables), settings)
    }

    /// Lit pass. Returns the number of lights drawn.
    pub fn draw(&mut self, recorder: &mut FrameRecorder, settings: &RenderSettings) -> usize {
        let drawables = collect_drawables(&self.models, self.water.as_ref());
        let view = SceneView {
            camera: self.cameras.get(self.active_camera),
            environment: self.environment.as_ref(),
            env_brightness: self.env_brightness,
            textures: &self.textures,
            drawables: &drawables,
        };
        self.composer.draw(recorder, &view, &self.lights, settings)
    }

    /// Shadow pass state machine, for inspection.
    #[must_use]
    pub fn shadow_driver(&self) -> &ShadowPassDriver {
        &self.shadow_driver
    }

    fn view<'a>(&'a self, drawables: &'a [&'a dyn Drawable]) -> SceneView<'a> {
        SceneView {
            camera: self.active_camera(),
            environment: self.environment.as_ref(),
            env_brightness: self.env_brightness,
            textures: &self.textures,
            drawables,
        }
    }
}

fn collect_drawables<'a>(models: &'a [Model], water: Option<&'a WaterSurface>) -> Vec<&'a dyn Drawable> {
    models
        .iter()
        .map(|m| m as &dyn Drawable)
        .chain(
            water
                .filter(|w| w.is_enabled())
                .map(|w| w as &dyn Drawable),
        )
        .collect()
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("models", &self.models.len())
            .field("lights", &self.lights.len())
            .field("cameras", &self.cameras.len())
            .field("active_camera", &self.active_camera)
            .field("textures", &self.textures.len())
            .field("environment", &self.environment.is_some())
            .field("water", &self.water.is_some())
            .finish_non_exhaustive()
    }
}
