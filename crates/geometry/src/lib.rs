//! Glyph geometry: extruded text shapes and the shape cache.
//!
//! # Invariants
//! - Exactly one `GlyphShape` exists per (character, font) pair in a cache.
//! - Shapes are immutable once built and shared through `Arc`.

mod cache;
mod extrude;
mod shape;

pub use cache::{CacheStats, GeometryCache};
pub use shape::{Aabb, BoxShape, GlyphKey, GlyphShape};

use glyphrain_assets::FontId;

/// Errors from building glyph shapes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("font {font} has no glyph for {character:?} and no '?' fallback")]
    MissingGlyph { character: char, font: FontId },
    #[error("cannot triangulate {character:?}: {message}")]
    Tessellation { character: char, message: String },
}

pub fn crate_info() -> &'static str {
    "glyphrain-geometry v0.1.0"
}
