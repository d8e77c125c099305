//! Procedural Water
//!
//! - [`NoiseField`]: seeded improved Perlin noise
//! - [`WaterSurface`]: heightfield mesh that follows a focus point
//! - [`WaterConfig`]: serializable parameters

pub mod config;
pub mod noise;
pub mod surface;

pub use config::WaterConfig;
pub use noise::NoiseField;
pub use surface::WaterSurface;
