//! Scene module
//!
//! - `Scene`: models, lights, cameras, environment and water
//! - `Light`: shadow-casting point and spot lights
//! - `Model`: meshes paired with materials, with an optional node hierarchy
//! - `NodeHierarchy`: arena of local transforms with cached world matrices
//! - `Camera`, `Transform`
//! - `PathAnimation`: time-parameterized looping path

pub mod animation;
pub mod camera;
pub mod hierarchy;
pub mod light;
pub mod model;
pub mod scene;
pub mod transform;

pub use animation::{PathAnimation, PathSample};
pub use camera::Camera;
pub use hierarchy::{HierarchyNode, NodeHierarchy, NodeIndex};
pub use light::{Light, LightType};
pub use model::Model;
pub use scene::Scene;
pub use transform::Transform;
