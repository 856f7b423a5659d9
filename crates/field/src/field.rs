use std::cell::RefCell;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use glyphrain_assets::{Font, Resource};
use glyphrain_common::{FieldConfig, GlyphParams, MAX_HALF_EXTENT, MAX_SWAP_INTERVAL_MS};
use glyphrain_geometry::GeometryCache;
use glyphrain_scene::SceneGraph;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::{AgentId, Alphabet, CharacterAgent, FieldError};

/// Creations requested through `spawn` that the field has not built yet.
/// Font continuations write here; `pump` drains it under `&mut self`.
#[derive(Debug, Default)]
struct Inbox {
    awaiting_font: usize,
    ready: Vec<(Arc<Font>, usize)>,
    failed: usize,
}

/// Owns every character agent and the deadline queue that drives their swaps.
pub struct CharacterField {
    config: FieldConfig,
    params: GlyphParams,
    alphabet: Alphabet,
    rng: SmallRng,
    agents: Vec<CharacterAgent>,
    schedule: BinaryHeap<Reverse<(Duration, AgentId)>>,
    inbox: Rc<RefCell<Inbox>>,
}

impl CharacterField {
    pub fn new(config: FieldConfig, params: GlyphParams, seed: u64) -> Result<Self, FieldError> {
        let alphabet = Alphabet::new(&config.alphabet)?;
        if config.swap_interval_min_ms == 0
            || config.swap_interval_min_ms > config.swap_interval_max_ms
            || config.swap_interval_max_ms > MAX_SWAP_INTERVAL_MS
        {
            return Err(FieldError::SwapInterval {
                min_ms: config.swap_interval_min_ms,
                max_ms: config.swap_interval_max_ms,
            });
        }
        if !(config.half_extent >= 0.0 && config.half_extent <= MAX_HALF_EXTENT) {
            return Err(FieldError::HalfExtent(config.half_extent));
        }
        Ok(Self {
            config,
            params,
            alphabet,
            rng: SmallRng::seed_from_u64(seed),
            agents: Vec::new(),
            schedule: BinaryHeap::new(),
            inbox: Rc::new(RefCell::new(Inbox::default())),
        })
    }

    /// Request `count` agents that share `font`. Nothing is built until the
    /// font resolves and the host calls `pump`; a failed font is logged and
    /// the request is dropped.
    pub fn spawn(&mut self, count: usize, font: &Resource<Font>) {
        self.inbox.borrow_mut().awaiting_font += count;

        let inbox = Rc::clone(&self.inbox);
        font.on_ready(move |font| {
            inbox.borrow_mut().ready.push((font, count));
        });

        let inbox = Rc::clone(&self.inbox);
        font.on_error(move |error| {
            tracing::warn!(%error, count, "font failed to load; character agents skipped");
            let mut inbox = inbox.borrow_mut();
            inbox.awaiting_font -= count;
            inbox.failed += count;
        });
    }

    /// Build every agent whose font has resolved. Returns the number created.
    pub fn pump(&mut self, now: Duration, cache: &mut GeometryCache, scene: &mut SceneGraph) -> usize {
        let batches = {
            let mut inbox = self.inbox.borrow_mut();
            let batches = std::mem::take(&mut inbox.ready);
            inbox.awaiting_font -= batches.iter().map(|(_, n)| n).sum::<usize>();
            batches
        };

        let mut created = 0;
        for (font, count) in batches {
            for _ in 0..count {
                let id = AgentId(self.agents.len() as u32);
                match CharacterAgent::create(
                    id,
                    Arc::clone(&font),
                    &self.alphabet,
                    &self.config,
                    &self.params,
                    now,
                    &mut self.rng,
                    cache,
                    scene,
                ) {
                    Ok(agent) => {
                        self.schedule.push(Reverse((agent.next_swap(), id)));
                        self.agents.push(agent);
                        created += 1;
                    }
                    Err(error) => {
                        tracing::warn!(%error, "character agent not created");
                        self.inbox.borrow_mut().failed += 1;
                    }
                }
            }
        }

        if created > 0 {
            tracing::debug!(created, total = self.agents.len(), cached = cache.len(), "agents created");
        }
        created
    }

    /// Fire every swap whose deadline is at or before `now`. Returns how many
    /// fired, including ones whose shape could not be built.
    pub fn tick(&mut self, now: Duration, cache: &mut GeometryCache, scene: &mut SceneGraph) -> usize {
        let mut fired = 0;
        while let Some(Reverse((deadline, id))) = self.schedule.peek().copied() {
            if deadline > now {
                break;
            }
            self.schedule.pop();
            let Some(agent) = self.agents.get_mut(id.0 as usize) else {
                continue;
            };
            if let Err(error) = agent.swap(now, &self.alphabet, &self.params, &mut self.rng, cache, scene) {
                tracing::warn!(agent = %id, %error, "swap failed; keeping current shape");
            }
            self.schedule.push(Reverse((agent.next_swap(), id)));
            fired += 1;
        }
        fired
    }

    pub fn agents(&self) -> &[CharacterAgent] {
        &self.agents
    }

    pub fn agent(&self, id: AgentId) -> Option<&CharacterAgent> {
        self.agents.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Requested agents still waiting on their font or on `pump`.
    pub fn pending(&self) -> usize {
        self.inbox.borrow().awaiting_font
    }

    /// Requested agents dropped because their font or first shape failed.
    pub fn failed(&self) -> usize {
        self.inbox.borrow().failed
    }

    /// Earliest swap deadline, if any agent exists.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.schedule.peek().map(|Reverse((deadline, _))| *deadline)
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyphrain_assets::ResourceLoadError;
    use glyphrain_scene::{Geometry, Layer};

    const BOX: &str = "m 0 0 l 600 0 l 600 700 l 0 700 z";
    const ALPHABET64: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789+/";

    fn stub_font(chars: &str) -> Font {
        Font::from_outlines("Stub", 1000.0, chars.chars().map(|c| (c, 600.0, BOX))).unwrap()
    }

    fn field(alphabet: &str, half_extent: f32) -> CharacterField {
        let config = FieldConfig {
            alphabet: alphabet.to_string(),
            half_extent,
            ..FieldConfig::default()
        };
        CharacterField::new(config, GlyphParams::default(), 42).unwrap()
    }

    #[test]
    fn rejects_bad_config() {
        let empty = FieldConfig {
            alphabet: String::new(),
            ..FieldConfig::default()
        };
        assert_eq!(
            CharacterField::new(empty, GlyphParams::default(), 0).err(),
            Some(FieldError::EmptyAlphabet)
        );
        let inverted = FieldConfig {
            swap_interval_min_ms: 10,
            swap_interval_max_ms: 5,
            ..FieldConfig::default()
        };
        assert!(matches!(
            CharacterField::new(inverted, GlyphParams::default(), 0),
            Err(FieldError::SwapInterval { .. })
        ));
    }

    #[test]
    fn extent_and_interval_are_capped() {
        let huge = FieldConfig {
            half_extent: 3.0e38,
            ..FieldConfig::default()
        };
        assert_eq!(
            CharacterField::new(huge, GlyphParams::default(), 0).err(),
            Some(FieldError::HalfExtent(3.0e38))
        );
        let slow = FieldConfig {
            swap_interval_max_ms: MAX_SWAP_INTERVAL_MS + 1,
            ..FieldConfig::default()
        };
        assert!(matches!(
            CharacterField::new(slow, GlyphParams::default(), 0),
            Err(FieldError::SwapInterval { .. })
        ));
    }

    #[test]
    fn largest_extent_spawns_without_panic() {
        let mut field = field("ab", MAX_HALF_EXTENT);
        let mut cache = GeometryCache::new();
        let mut scene = SceneGraph::new();
        field.spawn(8, &Resource::ready(stub_font("ab")));
        assert_eq!(field.pump(Duration::ZERO, &mut cache, &mut scene), 8);
        assert!(field
            .agents()
            .iter()
            .all(|a| a.position().abs().max_element() <= MAX_HALF_EXTENT));
    }

    #[test]
    fn spawn_ten_agents_inside_cube() {
        assert_eq!(ALPHABET64.chars().count(), 64);
        let mut field = field(ALPHABET64, 5.0);
        let mut cache = GeometryCache::new();
        let mut scene = SceneGraph::new();

        let font = Resource::ready(stub_font(ALPHABET64));
        field.spawn(10, &font);
        assert_eq!(field.pending(), 10);
        assert_eq!(field.pump(Duration::ZERO, &mut cache, &mut scene), 10);

        assert_eq!(field.len(), 10);
        assert_eq!(field.pending(), 0);
        assert_eq!(scene.layer_count(Layer::Field), 10);
        let font_id = font.get().unwrap().id();
        for agent in field.agents() {
            let p = agent.position();
            assert!(p.abs().max_element() <= 5.0, "{p} outside cube");
            assert!(cache.contains(agent.character(), font_id));
        }
    }

    #[test]
    fn nothing_created_before_font_resolves() {
        let mut field = field("abc", 10.0);
        let mut cache = GeometryCache::new();
        let mut scene = SceneGraph::new();

        let (font, resolver) = Resource::pending();
        field.spawn(3, &font);
        assert_eq!(field.pump(Duration::ZERO, &mut cache, &mut scene), 0);
        assert_eq!(field.pending(), 3);
        assert!(field.next_deadline().is_none());

        resolver.resolve(stub_font("abc"));
        assert_eq!(field.pending(), 3);
        assert_eq!(field.pump(Duration::from_millis(40), &mut cache, &mut scene), 3);
        assert_eq!(field.pending(), 0);
        assert!(field.next_deadline().unwrap() >= Duration::from_millis(290));
    }

    #[test]
    fn failed_font_creates_nothing() {
        let mut field = field("abc", 10.0);
        let mut cache = GeometryCache::new();
        let mut scene = SceneGraph::new();

        let (font, resolver) = Resource::<Font>::pending();
        field.spawn(4, &font);
        resolver.reject(ResourceLoadError::NotFound {
            path: "fonts/missing.json".into(),
        });

        assert_eq!(field.pump(Duration::ZERO, &mut cache, &mut scene), 0);
        assert!(field.is_empty());
        assert_eq!(field.pending(), 0);
        assert_eq!(field.failed(), 4);
        assert_eq!(scene.mesh_count(), 0);
    }

    #[test]
    fn one_font_fans_out_to_many_spawns() {
        let mut field = field("ab", 1.0);
        let mut cache = GeometryCache::new();
        let mut scene = SceneGraph::new();
        let (font, resolver) = Resource::pending();
        field.spawn(2, &font);
        field.spawn(5, &font);
        resolver.resolve(stub_font("ab"));
        assert_eq!(field.pump(Duration::ZERO, &mut cache, &mut scene), 7);
        assert!(cache.len() <= 2);
    }

    #[test]
    fn five_swaps_stay_in_alphabet() {
        let alphabet = "0123456789";
        let mut field = field(alphabet, 10.0);
        let mut cache = GeometryCache::new();
        let mut scene = SceneGraph::new();
        field.spawn(1, &Resource::ready(stub_font(alphabet)));
        field.pump(Duration::ZERO, &mut cache, &mut scene);

        for _ in 0..5 {
            let due = field.next_deadline().unwrap();
            assert_eq!(field.tick(due, &mut cache, &mut scene), 1);
            let agent = &field.agents()[0];
            assert!(alphabet.contains(agent.character()));
            let node = scene.get(agent.mesh()).unwrap();
            assert!(matches!(node.geometry, Geometry::Glyph(ref s) if Arc::ptr_eq(s, agent.shape())));
            assert!(cache.len() <= alphabet.len());
        }
        assert_eq!(field.agents()[0].swaps(), 5);
    }

    #[test]
    fn tick_before_deadline_fires_nothing() {
        let mut field = field("ab", 1.0);
        let mut cache = GeometryCache::new();
        let mut scene = SceneGraph::new();
        field.spawn(20, &Resource::ready(stub_font("ab")));
        field.pump(Duration::ZERO, &mut cache, &mut scene);
        // Shortest possible period is 250 ms.
        assert_eq!(field.tick(Duration::from_millis(249), &mut cache, &mut scene), 0);
    }

    #[test]
    fn late_host_fires_each_agent_once() {
        let mut field = field("ab", 1.0);
        let mut cache = GeometryCache::new();
        let mut scene = SceneGraph::new();
        field.spawn(8, &Resource::ready(stub_font("ab")));
        field.pump(Duration::ZERO, &mut cache, &mut scene);

        let late = Duration::from_secs(60);
        assert_eq!(field.tick(late, &mut cache, &mut scene), 8);
        assert!(field.next_deadline().unwrap() > late);
        assert!(field.agents().iter().all(|a| a.swaps() == 1));
    }

    #[test]
    fn same_seed_same_field() {
        let build = || {
            let mut field = field(ALPHABET64, 50.0);
            let mut cache = GeometryCache::new();
            let mut scene = SceneGraph::new();
            field.spawn(5, &Resource::ready(stub_font(ALPHABET64)));
            field.pump(Duration::ZERO, &mut cache, &mut scene);
            field
                .agents()
                .iter()
                .map(|a| (a.character(), a.position(), a.period()))
                .collect::<Vec<_>>()
        };
        assert_eq!(build(), build());
    }
}
