//! Error Types
//!
//! This module defines the error types used throughout the renderer.
//!
//! # Overview
//!
//! The main error type [`TidelightError`] covers the recoverable failure modes:
//! - GPU adapter and device acquisition
//! - Asset loading and decoding
//! - Configuration parsing
//! - Model hierarchy edits
//!
//! Degenerate geometric inputs (zero-length directions, coincident targets)
//! are never reported here; they resolve to fallback vectors at the call site.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tidelight::errors::Result;
//!
//! fn load() -> Result<()> {
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the renderer.
#[derive(Error, Debug)]
pub enum TidelightError {
    // ========================================================================
    // GPU Errors
    // ========================================================================
    /// Failed to request a compatible GPU adapter.
    #[error("Failed to request WGPU adapter: {0}")]
    AdapterRequestFailed(String),

    /// Failed to create the GPU device.
    #[error("Failed to create WGPU device: {0}")]
    DeviceCreateFailed(#[from] wgpu::RequestDeviceError),

    // ========================================================================
    // Asset Loading Errors
    // ========================================================================
    /// The requested asset was not found on disk.
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// The image decoder rejected the file.
    #[error("Failed to decode image '{path}': {source}")]
    ImageDecode {
        path: String,
        #[source]
        source: image::ImageError,
    },

    /// Only 1, 3 and 4 channel images can be uploaded.
    #[error("Unsupported channel count {channels} in '{path}'")]
    UnsupportedChannelCount { path: String, channels: u8 },

    /// The equirectangular source cannot be projected onto a cubemap.
    #[error("Invalid cubemap source: {0}")]
    InvalidCubemapSource(String),

    /// A mesh was paired with the wrong number of materials.
    #[error("Model has {meshes} meshes but {materials} materials")]
    MeshMaterialMismatch { meshes: usize, materials: usize },

    // ========================================================================
    // Hierarchy Errors
    // ========================================================================
    /// A node index does not exist in the model's node arena.
    #[error("Node index out of bounds: {index} (node count: {count})")]
    InvalidNode { index: usize, count: usize },

    /// Re-parenting would make a node its own ancestor.
    #[error("Parenting node {child} under {parent} would create a cycle")]
    HierarchyCycle { child: usize, parent: usize },

    // ========================================================================
    // I/O & Config Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Alias for `std::result::Result<T, TidelightError>`.
pub type Result<T> = std::result::Result<T, TidelightError>;
