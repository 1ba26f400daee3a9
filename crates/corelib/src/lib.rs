//! Core shared types: error taxonomy, skin color selection, math re-exports.

pub use glam::{Mat4, Vec2, Vec3, vec2, vec3};

pub mod color;
pub mod error;

pub use color::SkinColor;
pub use error::{IndexKind, LoadError, LoadResult};
