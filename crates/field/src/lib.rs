//! Character field: a pool of independently animated glyph meshes.
//!
//! # Invariants
//! - Agents are created only after their font resolves; a failed font means
//!   no agents, never a panic.
//! - Every agent always references a shape that lives in the geometry cache.
//! - Agent positions are fixed at creation and lie inside the spawn cube.
//! - Each agent fires at most once per `tick`, however late the host is.

mod agent;
mod alphabet;
mod field;

pub use agent::CharacterAgent;
pub use alphabet::Alphabet;
pub use field::CharacterField;

use std::fmt;

/// Index of an agent within its field, assigned in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent#{}", self.0)
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FieldError {
    #[error("alphabet is empty")]
    EmptyAlphabet,
    #[error("swap interval invalid: min {min_ms} ms, max {max_ms} ms")]
    SwapInterval { min_ms: u64, max_ms: u64 },
    #[error("spawn half-extent must be within 0..=1e6, got {0}")]
    HalfExtent(f32),
}

pub fn crate_info() -> &'static str {
    "glyphrain-field v0.1.0"
}
