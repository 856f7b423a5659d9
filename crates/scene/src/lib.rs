//! The single scene shared by the character field, the camera rig and the
//! renderer.
//!
//! # Invariants
//! - Every mesh belongs to exactly one `Layer`; field code only mutates
//!   `Layer::Field` meshes and the rig only mutates `Layer::Rig` meshes.
//! - Glyph geometry is an `Arc` shared with the geometry cache; replacing a
//!   mesh's geometry never copies vertex data.

pub mod graph;

pub use graph::{Geometry, Layer, Light, Material, MeshNode, SceneGraph};

pub fn crate_info() -> &'static str {
    "glyphrain-scene v0.1.0"
}
