//! Utility Module
//!
//! - [`config`]: JSON loading for configuration structs

pub mod config;

pub use config::JsonConfig;
