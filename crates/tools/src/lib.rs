//! Developer tooling: read-only scene inspector for logs and the CLI.
//!
//! # Invariants
//! - Tools never mutate the stage.

pub mod inspector;

pub use inspector::{MeshInfo, SceneInspector, SceneSummary};

pub fn crate_info() -> &'static str {
    "glyphrain-tools v0.1.0"
}
