//! Shared types for the glyphrain workspace: ids, transforms, and the
//! device-tier profile that sizes every other component.
//!
//! # Invariants
//! - A `Profile` that passed `validate` has non-inverted bounds, a non-empty
//!   alphabet and a non-empty swap interval.
//! - Tier selection happens once at startup; nothing re-reads it later.

pub mod config;
pub mod types;

pub use config::{
    AssetPaths, Bounds, CameraConfig, ConfigError, DeviceTier, FieldConfig, FrameConfig,
    GlyphParams, MAX_CURVE_SEGMENTS, MAX_FRAME_INTERVAL_MS, MAX_HALF_EXTENT, MAX_SWAP_INTERVAL_MS,
    Profile, ScrollConfig,
};
pub use types::{Color, MeshId, Transform};

pub fn crate_info() -> &'static str {
    "glyphrain-common v0.1.0"
}
