//! Rendering adapter: camera, frustum culling, renderer interface and the
//! throttled render loop.
//!
//! # Invariants
//! - Renderers never mutate the scene; only the culler writes, and only the
//!   `visible` flag.
//! - A skipped frame has no side effects.
//!
//! The crate ships a debug text renderer; a GPU backend implements the same
//! `Renderer` trait without changing consumers.

mod camera;
mod frustum;
mod render_loop;
mod renderer;

pub use camera::PerspectiveCamera;
pub use frustum::{CullStats, Frustum, VisibilityCuller};
pub use render_loop::{FrameOutcome, FrameTimer, RenderLoop};
pub use renderer::{DebugTextRenderer, Renderer, Viewport};

pub fn crate_info() -> &'static str {
    "glyphrain-render v0.1.0"
}
