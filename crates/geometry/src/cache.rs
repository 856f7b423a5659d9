use std::collections::BTreeMap;
use std::sync::Arc;

use glyphrain_assets::{Font, FontId};
use glyphrain_common::GlyphParams;

use crate::GeometryError;
use crate::extrude::extrude_glyph;
use crate::shape::{GlyphKey, GlyphShape};

/// Counters for the inspector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub allocations: u64,
    pub hits: u64,
    pub triangles: usize,
}

/// Process-lifetime memo table from (character, font) to shape.
///
/// There is no eviction: a shape, once built, is shared by every agent that
/// displays its character for as long as the cache lives. The size params of
/// the first request for a key win; a profile uses one set of params for its
/// whole lifetime.
#[derive(Debug, Default)]
pub struct GeometryCache {
    shapes: BTreeMap<GlyphKey, Arc<GlyphShape>>,
    allocations: u64,
    hits: u64,
}

impl GeometryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached shape for `(character, font)`, building it on a miss.
    pub fn get_or_create(
        &mut self,
        character: char,
        font: &Font,
        params: &GlyphParams,
    ) -> Result<Arc<GlyphShape>, GeometryError> {
        let key = GlyphKey {
            character,
            font: font.id(),
        };
        if let Some(shape) = self.shapes.get(&key) {
            self.hits += 1;
            return Ok(Arc::clone(shape));
        }

        let glyph = font
            .glyph_or_fallback(character)
            .ok_or(GeometryError::MissingGlyph {
                character,
                font: font.id(),
            })?;
        let shape = extrude_glyph(key, glyph, font.resolution(), params)
            .map_err(|message| GeometryError::Tessellation { character, message })?;

        self.allocations += 1;
        tracing::debug!(
            character = %character.escape_debug(),
            font = %font.id(),
            vertices = shape.vertex_count(),
            triangles = shape.triangle_count(),
            "glyph shape built"
        );

        let shape = Arc::new(shape);
        self.shapes.insert(key, Arc::clone(&shape));
        Ok(shape)
    }

    pub fn get(&self, character: char, font: FontId) -> Option<&Arc<GlyphShape>> {
        self.shapes.get(&GlyphKey { character, font })
    }

    pub fn contains(&self, character: char, font: FontId) -> bool {
        self.get(character, font).is_some()
    }

    /// Number of cached shapes.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Shapes built so far (equals `len` because nothing is evicted).
    pub fn allocations(&self) -> u64 {
        self.allocations
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn shapes(&self) -> impl Iterator<Item = &Arc<GlyphShape>> {
        self.shapes.values()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.shapes.len(),
            allocations: self.allocations,
            hits: self.hits,
            triangles: self.shapes.values().map(|s| s.triangle_count()).sum(),
        }
    }
}
