//! Stage: the one context object a host owns.
//!
//! # Invariants
//! - All state lives in the `Stage`; nothing is global.
//! - Exactly one font load and one texture load per stage.
//! - Field meshes and rig meshes share one scene but never touch each other's
//!   layer.

mod stage;

pub use stage::{Stage, StageError, UpdateReport};

pub fn crate_info() -> &'static str {
    "glyphrain-stage v0.1.0"
}
