use std::time::Duration;

use glam::Vec3;
use glyphrain_common::MeshId;
use glyphrain_geometry::CacheStats;
use glyphrain_render::Renderer;
use glyphrain_scene::{Geometry, Layer, SceneGraph};
use glyphrain_stage::Stage;

/// Scene inspector for developer tooling.
///
/// Provides read-only queries against a stage for debugging, profiling and
/// CLI output.
pub struct SceneInspector;

impl SceneInspector {
    /// Produce a summary of the stage.
    pub fn summary<R: Renderer>(stage: &Stage<R>) -> SceneSummary {
        let scene = stage.scene();
        let camera = stage.camera();
        let frames = stage.render_loop();
        SceneSummary {
            meshes: scene.mesh_count(),
            visible: scene.visible_count(),
            agents: stage.field().len(),
            pending: stage.field().pending(),
            cache: stage.cache().stats(),
            camera_position: camera.position,
            camera_yaw: camera.rotation.y,
            frames_rendered: frames.rendered(),
            frames_skipped: frames.skipped(),
            average_frame: frames.timer().average(),
        }
    }

    /// Describe one mesh.
    pub fn inspect_mesh(scene: &SceneGraph, id: MeshId) -> Option<MeshInfo> {
        scene.get(id).map(|mesh| MeshInfo {
            id,
            name: mesh.name.clone(),
            layer: mesh.layer,
            position: mesh.transform.position,
            rotation: mesh.transform.rotation,
            glyph: match &mesh.geometry {
                Geometry::Glyph(shape) => Some(shape.character()),
                Geometry::Cuboid(_) => None,
            },
            triangles: mesh.geometry.triangle_count(),
            visible: mesh.visible,
        })
    }

    /// Ids of all meshes on `layer`, in scene order.
    pub fn list_meshes(scene: &SceneGraph, layer: Layer) -> Vec<MeshId> {
        scene
            .meshes()
            .filter(|(_, m)| m.layer == layer)
            .map(|(id, _)| id)
            .collect()
    }
}

/// Summary of stage state for the inspector.
#[derive(Debug, Clone)]
pub struct SceneSummary {
    pub meshes: usize,
    pub visible: usize,
    pub agents: usize,
    pub pending: usize,
    pub cache: CacheStats,
    pub camera_position: Vec3,
    pub camera_yaw: f32,
    pub frames_rendered: u64,
    pub frames_skipped: u64,
    pub average_frame: Duration,
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let p = self.camera_position;
        write!(
            f,
            "Scene: meshes={} visible={} agents={} pending={} shapes={} camera=({:.2}, {:.2}, {:.2}) yaw={:.3} frames={} skipped={} avg={:.2}ms",
            self.meshes,
            self.visible,
            self.agents,
            self.pending,
            self.cache.entries,
            p.x,
            p.y,
            p.z,
            self.camera_yaw,
            self.frames_rendered,
            self.frames_skipped,
            self.average_frame.as_secs_f64() * 1000.0
        )
    }
}

/// Detailed info about a single mesh.
#[derive(Debug, Clone)]
pub struct MeshInfo {
    pub id: MeshId,
    pub name: String,
    pub layer: Layer,
    pub position: Vec3,
    pub rotation: Vec3,
    pub glyph: Option<char>,
    pub triangles: usize,
    pub visible: bool,
}

impl std::fmt::Display for MeshInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Mesh [{}] {} {:?} pos=({:.2}, {:.2}, {:.2}) tris={} visible={}",
            self.id.short(),
            self.name,
            self.layer,
            self.position.x,
            self.position.y,
            self.position.z,
            self.triangles,
            self.visible
        )?;
        if let Some(c) = self.glyph {
            write!(f, " glyph={c:?}")?;
        }
        Ok(())
    }
}
