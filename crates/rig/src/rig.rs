use glam::Vec3;
use glyphrain_assets::{Resource, Texture};
use glyphrain_common::{Color, MeshId, ScrollConfig, Transform};
use glyphrain_geometry::BoxShape;
use glyphrain_render::{PerspectiveCamera, Renderer, Viewport};
use glyphrain_scene::{Geometry, Layer, Material, MeshNode, SceneGraph};

pub const AVATAR_POSITION: Vec3 = Vec3::new(0.0, 0.0, -5.0);
pub const AVATAR_EDGE: f32 = 3.0;

/// Owns the avatar mesh and drives the camera from scroll and resize events.
#[derive(Debug)]
pub struct CameraRig {
    config: ScrollConfig,
    avatar: MeshId,
    scrolls: u64,
    last_offset: f32,
}

impl CameraRig {
    /// Add the avatar to the scene and apply offset 0 so the camera starts in
    /// a valid, clamped pose.
    ///
    /// The texture may still be loading; it is attached as-is and shows up
    /// once ready. A failed texture leaves the avatar untextured.
    pub fn install(
        config: ScrollConfig,
        avatar_texture: Resource<Texture>,
        camera: &mut PerspectiveCamera,
        scene: &mut SceneGraph,
    ) -> Self {
        avatar_texture.on_error(|error| {
            tracing::warn!(%error, "avatar texture failed to load; rendering untextured");
        });
        avatar_texture.on_ready(|texture| {
            tracing::debug!(source = %texture.source, bytes = texture.byte_len(), "avatar texture ready");
        });

        let avatar = scene.add_mesh(MeshNode::new(
            "avatar",
            Layer::Rig,
            Transform::from_position(AVATAR_POSITION),
            Geometry::Cuboid(BoxShape::cube(AVATAR_EDGE)),
            vec![Material::Standard {
                color: Color::WHITE,
                map: Some(avatar_texture),
                metalness: 0.0,
                roughness: 0.8,
            }],
        ));

        let mut rig = Self {
            config,
            avatar,
            scrolls: 0,
            last_offset: 0.0,
        };
        rig.on_scroll(0.0, camera, scene);
        rig
    }

    /// Recompute the camera pose from the scroll offset and step the avatar
    /// rotation once.
    pub fn on_scroll(&mut self, raw_offset: f32, camera: &mut PerspectiveCamera, scene: &mut SceneGraph) {
        let offset = if raw_offset.is_finite() { raw_offset } else { 0.0 };
        let cfg = &self.config;

        camera.position.z = cfg.z_bounds.clamp(offset * -cfg.scroll_factor);
        camera.position.x = cfg.x_bounds.clamp(offset * -cfg.rotation_factor);
        camera.rotation.y = cfg.rotation_bounds.clamp(offset * -cfg.rotation_factor);

        if let Some(avatar) = scene.get_mut(self.avatar) {
            avatar.transform.rotation.y += cfg.avatar_step;
            avatar.transform.rotation.z += cfg.avatar_step;
        }

        self.scrolls += 1;
        self.last_offset = offset;
        tracing::trace!(
            offset,
            z = camera.position.z,
            x = camera.position.x,
            yaw = camera.rotation.y,
            "camera moved"
        );
    }

    /// Update the camera aspect and tell the renderer about the new size.
    /// A zero-sized viewport keeps the previous aspect.
    pub fn on_resize<R: Renderer>(
        &self,
        width: u32,
        height: u32,
        camera: &mut PerspectiveCamera,
        renderer: &mut R,
    ) {
        let viewport = Viewport::new(width, height);
        match viewport.aspect() {
            Some(aspect) => camera.aspect = aspect,
            None => tracing::debug!(width, height, "degenerate viewport; aspect unchanged"),
        }
        renderer.set_viewport(viewport);
    }

    pub fn avatar(&self) -> MeshId {
        self.avatar
    }

    /// Scroll updates applied so far, including the one at install.
    pub fn scrolls(&self) -> u64 {
        self.scrolls
    }

    pub fn last_offset(&self) -> f32 {
        self.last_offset
    }

    pub fn config(&self) -> &ScrollConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyphrain_assets::ResourceLoadError;
    use glyphrain_common::DeviceTier;
    use glyphrain_render::DebugTextRenderer;

    fn installed(config: ScrollConfig) -> (CameraRig, PerspectiveCamera, SceneGraph) {
        let mut camera = PerspectiveCamera::default();
        let mut scene = SceneGraph::new();
        let (texture, _resolver) = Resource::pending();
        let rig = CameraRig::install(config, texture, &mut camera, &mut scene);
        (rig, camera, scene)
    }

    fn assert_clamped(camera: &PerspectiveCamera, config: &ScrollConfig) {
        assert!(config.z_bounds.contains(camera.position.z), "z {}", camera.position.z);
        assert!(config.x_bounds.contains(camera.position.x), "x {}", camera.position.x);
        assert!(
            config.rotation_bounds.contains(camera.rotation.y),
            "yaw {}",
            camera.rotation.y
        );
    }

    #[test]
    fn install_applies_offset_zero() {
        let (rig, camera, scene) = installed(ScrollConfig::default());
        assert_eq!(camera.position.z, 0.0);
        assert_eq!(camera.position.x, 0.0);
        assert_eq!(camera.rotation.y, 0.0);
        assert_eq!(rig.scrolls(), 1);

        let avatar = scene.get(rig.avatar()).unwrap();
        assert_eq!(avatar.layer, Layer::Rig);
        assert_eq!(avatar.transform.position, AVATAR_POSITION);
        assert!((avatar.transform.rotation.y - 0.01).abs() < 1e-6);
    }

    #[test]
    fn linear_inside_bounds() {
        let config = ScrollConfig::default();
        let (mut rig, mut camera, mut scene) = installed(config);
        rig.on_scroll(-1000.0, &mut camera, &mut scene);
        assert!((camera.position.z - 10.0).abs() < 1e-5);
        assert!((camera.position.x - 0.2).abs() < 1e-6);
        assert!((camera.rotation.y - 0.2).abs() < 1e-6);
    }

    #[test]
    fn constrained_tier_moves_slower() {
        let config = ScrollConfig::for_tier(DeviceTier::Constrained);
        let (mut rig, mut camera, mut scene) = installed(config);
        rig.on_scroll(-1000.0, &mut camera, &mut scene);
        assert!((camera.position.z - 5.0).abs() < 1e-5);
        assert!((camera.rotation.y - 0.1).abs() < 1e-6);
    }

    #[test]
    fn clamp_holds_for_extreme_offsets() {
        let config = ScrollConfig::default();
        let (mut rig, mut camera, mut scene) = installed(config);
        for offset in [1e9, -1e9, f32::MAX, f32::MIN, 12345.0, -98765.0] {
            rig.on_scroll(offset, &mut camera, &mut scene);
            assert_clamped(&camera, &config);
        }

        rig.on_scroll(-1e9, &mut camera, &mut scene);
        assert_eq!(camera.position.z, 30.0);
        assert_eq!(camera.position.x, 5.0);
        assert_eq!(camera.rotation.y, 1.0);

        rig.on_scroll(1e9, &mut camera, &mut scene);
        assert_eq!(camera.position.z, -100.0);
        assert_eq!(camera.position.x, -20.0);
        assert_eq!(camera.rotation.y, -1.0);
    }

    #[test]
    fn non_finite_offset_is_zero() {
        let config = ScrollConfig::default();
        let (mut rig, mut camera, mut scene) = installed(config);
        for offset in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            rig.on_scroll(offset, &mut camera, &mut scene);
            assert_clamped(&camera, &config);
            assert_eq!(camera.position.z, 0.0);
            assert_eq!(rig.last_offset(), 0.0);
        }
    }

    #[test]
    fn avatar_rotates_per_event_not_per_offset() {
        let (mut rig, mut camera, mut scene) = installed(ScrollConfig::default());
        for _ in 0..9 {
            rig.on_scroll(-50.0, &mut camera, &mut scene);
        }
        let rotation = scene.get(rig.avatar()).unwrap().transform.rotation;
        assert!((rotation.y - 0.1).abs() < 1e-5);
        assert!((rotation.z - 0.1).abs() < 1e-5);
        assert_eq!(rotation.x, 0.0);
    }

    #[test]
    fn resize_is_idempotent() {
        let (rig, mut camera, _) = installed(ScrollConfig::default());
        let mut renderer = DebugTextRenderer::new();
        rig.on_resize(1920, 1080, &mut camera, &mut renderer);
        let once = (camera, renderer.viewport());
        rig.on_resize(1920, 1080, &mut camera, &mut renderer);
        assert_eq!((camera, renderer.viewport()), once);
        assert!((camera.aspect - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn zero_sized_resize_keeps_aspect() {
        let (rig, mut camera, _) = installed(ScrollConfig::default());
        let mut renderer = DebugTextRenderer::new();
        rig.on_resize(800, 400, &mut camera, &mut renderer);
        rig.on_resize(0, 400, &mut camera, &mut renderer);
        assert_eq!(camera.aspect, 2.0);
        assert_eq!(renderer.viewport(), Viewport::new(0, 400));
    }

    #[test]
    fn failed_texture_leaves_avatar_untextured() {
        let mut camera = PerspectiveCamera::default();
        let mut scene = SceneGraph::new();
        let texture = Resource::failed(ResourceLoadError::NotFound {
            path: "img/blane.png".into(),
        });
        let rig = CameraRig::install(ScrollConfig::default(), texture, &mut camera, &mut scene);
        let avatar = scene.get(rig.avatar()).unwrap();
        assert!(avatar.materials[0].ready_map().is_none());
        assert_eq!(scene.mesh_count(), 1);
    }
}
