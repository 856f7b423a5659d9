use std::time::Duration;

use glyphrain_assets::{Font, FontLoader, Resource, TextureLoader};
use glyphrain_common::{Color, ConfigError, Profile};
use glyphrain_field::{CharacterField, FieldError};
use glyphrain_geometry::GeometryCache;
use glyphrain_render::{FrameOutcome, PerspectiveCamera, RenderLoop, Renderer, Viewport};
use glyphrain_rig::{CameraRig, ViewEvent};
use glyphrain_scene::{Light, SceneGraph};

#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("invalid profile: {0}")]
    Config(#[from] ConfigError),
    #[error("field setup failed: {0}")]
    Field(#[from] FieldError),
}

/// What one `update` call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateReport {
    pub created: usize,
    pub swaps: usize,
}

/// Scene, camera, cache, field, rig and render loop for one page.
pub struct Stage<R: Renderer> {
    profile: Profile,
    scene: SceneGraph,
    camera: PerspectiveCamera,
    cache: GeometryCache,
    field: CharacterField,
    rig: CameraRig,
    render_loop: RenderLoop,
    renderer: R,
    font: Resource<Font>,
}

impl<R: Renderer> Stage<R> {
    /// Build the scene and start both asset loads. Agents appear on the
    /// first `update` after the font resolves.
    pub fn new<L>(
        profile: Profile,
        renderer: R,
        loader: &L,
        viewport: Viewport,
        seed: u64,
    ) -> Result<Self, StageError>
    where
        L: FontLoader + TextureLoader,
    {
        profile.validate()?;

        let mut scene = SceneGraph::new();
        let mut camera = PerspectiveCamera::from_config(&profile.camera, viewport.aspect().unwrap_or(1.0));
        scene.add_light(Light::Point {
            color: Color::WHITE,
            intensity: 1000.0,
            position: profile.camera.initial_position,
        });
        scene.add_light(Light::Ambient {
            color: Color::WHITE,
            intensity: 0.5,
        });

        let font = loader.load_font(&profile.assets.font);
        let mut field = CharacterField::new(profile.field.clone(), profile.glyph, seed)?;
        field.spawn(profile.field.agent_count, &font);

        let texture = loader.load_texture(&profile.assets.avatar_texture);
        let rig = CameraRig::install(profile.scroll, texture, &mut camera, &mut scene);

        let mut renderer = renderer;
        rig.on_resize(viewport.width, viewport.height, &mut camera, &mut renderer);
        let render_loop = RenderLoop::new(profile.frame.min_frame_interval());

        tracing::info!(
            tier = %profile.tier,
            agents = profile.field.agent_count,
            font = %profile.assets.font,
            seed,
            "stage created"
        );

        Ok(Self {
            profile,
            scene,
            camera,
            cache: GeometryCache::new(),
            field,
            rig,
            render_loop,
            renderer,
            font,
        })
    }

    pub fn on_scroll(&mut self, offset: f32) {
        self.rig.on_scroll(offset, &mut self.camera, &mut self.scene);
    }

    pub fn on_resize(&mut self, width: u32, height: u32) {
        self.rig
            .on_resize(width, height, &mut self.camera, &mut self.renderer);
    }

    pub fn handle(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::Scroll(offset) => self.on_scroll(offset),
            ViewEvent::Resize { width, height } => self.on_resize(width, height),
        }
    }

    /// Materialize agents whose font has resolved and fire due swaps.
    pub fn update(&mut self, now: Duration) -> UpdateReport {
        let created = self.field.pump(now, &mut self.cache, &mut self.scene);
        let swaps = self.field.tick(now, &mut self.cache, &mut self.scene);
        UpdateReport { created, swaps }
    }

    /// One host frame callback.
    pub fn frame(&mut self, now: Duration) -> FrameOutcome<R::Output> {
        self.render_loop
            .step(now, &self.camera, &mut self.scene, &mut self.renderer)
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn cache(&self) -> &GeometryCache {
        &self.cache
    }

    pub fn field(&self) -> &CharacterField {
        &self.field
    }

    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    pub fn render_loop(&self) -> &RenderLoop {
        &self.render_loop
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn font(&self) -> &Resource<Font> {
        &self.font
    }
}
