//! Meshport Core - Shared value types for the meshport workspace
//!
//! This crate provides the small geometric primitives used by the mesh
//! model and its exporters:
//! - `Vector3` for positions and normals
//! - `Vector2` for texture coordinates
//!
//! Both convert to and from the corresponding glam types.

pub mod types;

pub use glam::{Vec2, Vec3};
pub use types::{Vector2, Vector3};
