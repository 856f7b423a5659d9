//! Camera rig: maps page scroll and viewport size onto the camera and the
//! avatar.
//!
//! # Invariants
//! - Camera z, x and yaw stay inside their configured bounds for every
//!   input, including non-finite offsets.
//! - Hosts deliver raw view events; the rig never reads platform state.

pub mod event;
pub mod rig;

pub use event::ViewEvent;
pub use rig::{AVATAR_EDGE, AVATAR_POSITION, CameraRig};

pub fn crate_info() -> &'static str {
    "glyphrain-rig v0.1.0"
}
