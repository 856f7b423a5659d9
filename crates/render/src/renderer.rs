use std::fmt::Write as _;

use glyphrain_scene::{Geometry, Light, SceneGraph};

use crate::PerspectiveCamera;

/// Output surface size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height; `None` when either side is zero.
    pub fn aspect(&self) -> Option<f32> {
        (self.width > 0 && self.height > 0).then(|| self.width as f32 / self.height as f32)
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads the scene and camera, then produces output. It never
/// mutates the scene; visibility flags are already decided by the culler.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame of the visible meshes.
    fn render(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera) -> Self::Output;

    /// Called on every resize.
    fn set_viewport(&mut self, viewport: Viewport);
}

/// Produces a human-readable frame listing the visible meshes.
/// Useful for CLI output, logging, and testing the render interface.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    viewport: Viewport,
    frames: u64,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera) -> String {
        self.frames += 1;
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Frame {} ({}x{}) ===",
            self.frames, self.viewport.width, self.viewport.height
        );
        let _ = writeln!(
            out,
            "Meshes: {} ({} visible)  Lights: {}",
            scene.mesh_count(),
            scene.visible_count(),
            scene.lights().len()
        );
        let p = camera.position;
        let look = camera.forward();
        let _ = writeln!(
            out,
            "Camera: pos=({:.2}, {:.2}, {:.2}) look=({:.3}, {:.3}, {:.3}) fov={:.0} aspect={:.3}",
            p.x, p.y, p.z, look.x, look.y, look.z, camera.fov_degrees, camera.aspect
        );

        for light in scene.lights() {
            match light {
                Light::Point {
                    color,
                    intensity,
                    position,
                } => {
                    let _ = writeln!(
                        out,
                        "  light point {color} i={intensity} at ({:.1}, {:.1}, {:.1})",
                        position.x, position.y, position.z
                    );
                }
                Light::Ambient { color, intensity } => {
                    let _ = writeln!(out, "  light ambient {color} i={intensity}");
                }
            }
        }

        // Scene slot, not the mesh id: ids are random per run.
        for (slot, (_, mesh)) in scene.meshes().enumerate().filter(|(_, (_, m))| m.visible) {
            let p = mesh.transform.position;
            let what = match &mesh.geometry {
                Geometry::Glyph(shape) => format!("glyph {:?}", shape.character()),
                Geometry::Cuboid(b) => format!("box {}x{}x{}", b.width, b.height, b.depth),
            };
            let _ = writeln!(
                out,
                "  [{slot}] {} {what} pos=({:.2}, {:.2}, {:.2})",
                mesh.name,
                p.x,
                p.y,
                p.z
            );
        }

        out
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        tracing::debug!(width = viewport.width, height = viewport.height, "viewport set");
        self.viewport = viewport;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use glyphrain_common::{Color, Transform};
    use glyphrain_geometry::BoxShape;
    use glyphrain_scene::{Layer, Material, MeshNode};

    #[test]
    fn debug_renderer_empty_scene() {
        let scene = SceneGraph::new();
        let mut renderer = DebugTextRenderer::new();
        let output = renderer.render(&scene, &PerspectiveCamera::default());

        assert!(output.contains("Frame 1"));
        assert!(output.contains("Meshes: 0"));
        assert!(output.contains("look=("));
    }

    #[test]
    fn debug_renderer_lists_only_visible_meshes() {
        let mut scene = SceneGraph::new();
        let mesh = |name: &str| {
            MeshNode::new(
                name,
                Layer::Rig,
                Transform::from_position(Vec3::new(1.0, 2.0, 3.0)),
                Geometry::Cuboid(BoxShape::cube(3.0)),
                vec![Material::phong(Color::WHITE)],
            )
        };
        scene.add_mesh(mesh("shown"));
        let hidden = scene.add_mesh(mesh("hidden"));
        scene.get_mut(hidden).unwrap().visible = false;
        scene.add_light(Light::Ambient {
            color: Color::WHITE,
            intensity: 0.5,
        });

        let mut renderer = DebugTextRenderer::new();
        let output = renderer.render(&scene, &PerspectiveCamera::default());

        assert!(output.contains("Meshes: 2 (1 visible)"));
        assert!(output.contains("[0] shown box 3x3x3 pos=(1.00, 2.00, 3.00)"));
        assert!(!output.contains("hidden box"));
        assert!(output.contains("light ambient #ffffff"));
    }

    #[test]
    fn viewport_aspect() {
        assert_eq!(Viewport::new(200, 100).aspect(), Some(2.0));
        assert_eq!(Viewport::new(0, 100).aspect(), None);
        assert_eq!(Viewport::new(100, 0).aspect(), None);
    }

    #[test]
    fn set_viewport_is_recorded() {
        let mut renderer = DebugTextRenderer::new();
        renderer.set_viewport(Viewport::new(640, 480));
        assert_eq!(renderer.viewport(), Viewport::new(640, 480));
    }
}
