//! Asset loading: promise-like resources, typeface fonts, textures.
//!
//! Consumers never touch files; they receive a `Resource<T>` and attach
//! continuations. A load that fails settles the resource as failed and the
//! error stays inside the continuation boundary.
//!
//! # Invariants
//! - A resource settles at most once.
//! - `FontLibrary` forwards at most one request per path to its loader.

mod font;
mod loader;
mod resource;
mod texture;

pub use font::{Font, FontError, FontId, Glyph, PathCommand, parse_outline};
pub use loader::{DeferredLoader, FontLibrary, FontLoader, FsLoader, TextureLoader};
pub use resource::{LoadProgress, Resolver, Resource, ResourceState};
pub use texture::{ImageFormat, Texture, TextureId};

/// Errors surfaced through failed resources.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResourceLoadError {
    #[error("asset not found: {path}")]
    NotFound { path: String },
    #[error("IO error reading {path}: {message}")]
    Io { path: String, message: String },
    #[error("cannot parse {path}: {message}")]
    Parse { path: String, message: String },
}

impl ResourceLoadError {
    pub fn path(&self) -> &str {
        match self {
            Self::NotFound { path } | Self::Io { path, .. } | Self::Parse { path, .. } => path,
        }
    }
}

pub fn crate_info() -> &'static str {
    "glyphrain-assets v0.1.0"
}
