use std::sync::Arc;
use std::time::Duration;

use glam::Vec3;
use glyphrain_assets::Font;
use glyphrain_common::{FieldConfig, GlyphParams, MeshId, Transform};
use glyphrain_geometry::{GeometryCache, GeometryError, GlyphShape};
use glyphrain_scene::{Geometry, Layer, Material, MeshNode, SceneGraph};
use rand::Rng;

use crate::{AgentId, Alphabet};

/// One glyph mesh that swaps its character on its own fixed period.
#[derive(Debug)]
pub struct CharacterAgent {
    id: AgentId,
    mesh: MeshId,
    font: Arc<Font>,
    position: Vec3,
    shape: Arc<GlyphShape>,
    period: Duration,
    next_swap: Duration,
    swaps: u64,
}

impl CharacterAgent {
    /// Pick a character and a position, fetch the shape and register the
    /// mesh on the field layer. The first swap is due one period after `now`.
    #[allow(clippy::too_many_arguments)]
    pub fn create<R: Rng + ?Sized>(
        id: AgentId,
        font: Arc<Font>,
        alphabet: &Alphabet,
        config: &FieldConfig,
        params: &GlyphParams,
        now: Duration,
        rng: &mut R,
        cache: &mut GeometryCache,
        scene: &mut SceneGraph,
    ) -> Result<Self, GeometryError> {
        let character = alphabet.pick(rng);
        let shape = cache.get_or_create(character, &font, params)?;

        let h = config.half_extent;
        let position = Vec3::new(
            rng.gen_range(-h..=h),
            rng.gen_range(-h..=h),
            rng.gen_range(-h..=h),
        );
        let (min, max) = config.swap_interval();
        let period = if max > min { rng.gen_range(min..max) } else { min };

        let mesh = scene.add_mesh(MeshNode::new(
            format!("glyph-{}", id.0),
            Layer::Field,
            Transform::from_position(position),
            Geometry::Glyph(Arc::clone(&shape)),
            vec![
                Material::phong(config.front_color),
                Material::phong(config.side_color),
            ],
        ));

        Ok(Self {
            id,
            mesh,
            font,
            position,
            shape,
            period,
            next_swap: now.saturating_add(period),
            swaps: 0,
        })
    }

    /// Fire one swap: pick a new character and point both the agent and its
    /// mesh at the cached shape. On error the current shape stays.
    ///
    /// The deadline advances regardless of the outcome, skipping any periods
    /// that already lie in the past.
    pub fn swap<R: Rng + ?Sized>(
        &mut self,
        now: Duration,
        alphabet: &Alphabet,
        params: &GlyphParams,
        rng: &mut R,
        cache: &mut GeometryCache,
        scene: &mut SceneGraph,
    ) -> Result<char, GeometryError> {
        self.advance_deadline(now);

        let character = alphabet.pick(rng);
        let shape = cache.get_or_create(character, &self.font, params)?;
        scene.set_geometry(self.mesh, Geometry::Glyph(Arc::clone(&shape)));
        self.shape = shape;
        self.swaps += 1;
        tracing::trace!(agent = %self.id, character = %character.escape_debug(), "swap");
        Ok(character)
    }

    fn advance_deadline(&mut self, now: Duration) {
        let period = self.period.as_nanos().max(1);
        self.next_swap = self.next_swap.saturating_add(self.period);
        if self.next_swap <= now {
            let behind = (now - self.next_swap).as_nanos();
            let skipped = behind / period + 1;
            let nanos = u64::try_from(period.saturating_mul(skipped)).unwrap_or(u64::MAX);
            self.next_swap = self.next_swap.saturating_add(Duration::from_nanos(nanos));
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn mesh(&self) -> MeshId {
        self.mesh
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn character(&self) -> char {
        self.shape.character()
    }

    pub fn shape(&self) -> &Arc<GlyphShape> {
        &self.shape
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn next_swap(&self) -> Duration {
        self.next_swap
    }

    /// Successful swaps so far.
    pub fn swaps(&self) -> u64 {
        self.swaps
    }
}
