use std::ops::Range;

use glam::Vec3;
use glyphrain_assets::FontId;
use glyphrain_common::GlyphParams;

/// Cache key: one shape per character per font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlyphKey {
    pub character: char,
    pub font: FontId,
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::ZERO,
        max: Vec3::ZERO,
    };

    pub fn from_points(points: &[Vec3]) -> Self {
        let Some(first) = points.first() else {
            return Self::EMPTY;
        };
        let (min, max) = points
            .iter()
            .fold((*first, *first), |(lo, hi), p| (lo.min(*p), hi.max(*p)));
        Self { min, max }
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Immutable extruded text geometry for a single character.
///
/// Index group 0 covers both caps and is drawn with the front material;
/// group 1 covers the side walls and is drawn with the side material.
#[derive(Debug, Clone)]
pub struct GlyphShape {
    pub key: GlyphKey,
    pub params: GlyphParams,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub groups: [Range<u32>; 2],
    pub bounds: Aabb,
}

impl GlyphShape {
    pub fn character(&self) -> char {
        self.key.character
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn cap_indices(&self) -> &[u32] {
        let r = &self.groups[0];
        &self.indices[r.start as usize..r.end as usize]
    }

    pub fn side_indices(&self) -> &[u32] {
        let r = &self.groups[1];
        &self.indices[r.start as usize..r.end as usize]
    }
}

/// Box geometry used for the avatar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxShape {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
}

impl BoxShape {
    pub fn cube(edge: f32) -> Self {
        Self {
            width: edge,
            height: edge,
            depth: edge,
        }
    }

    /// Four unshared vertices per face.
    pub fn vertex_count(&self) -> usize {
        24
    }

    pub fn triangle_count(&self) -> usize {
        12
    }

    pub fn bounds(&self) -> Aabb {
        let half = Vec3::new(self.width, self.height, self.depth) * 0.5;
        Aabb {
            min: -half,
            max: half,
        }
    }
}
