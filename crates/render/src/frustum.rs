use glam::{Mat4, Vec3, Vec4};
use glyphrain_scene::SceneGraph;

use crate::PerspectiveCamera;

/// Six inward-facing planes `(normal, d)`: left, right, bottom, top, near, far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    pub planes: [Vec4; 6],
}

impl Frustum {
    /// Extract planes from a view-projection matrix with OpenGL clip depth.
    pub fn from_view_projection(m: Mat4) -> Self {
        let (r0, r1, r2, r3) = (m.row(0), m.row(1), m.row(2), m.row(3));
        let planes = [r3 + r0, r3 - r0, r3 + r1, r3 - r1, r3 + r2, r3 - r2].map(|p| {
            let len = p.truncate().length();
            if len > 0.0 { p / len } else { p }
        });
        Self { planes }
    }

    pub fn from_camera(camera: &PerspectiveCamera) -> Self {
        Self::from_view_projection(camera.view_projection())
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        let p = point.extend(1.0);
        self.planes.iter().all(|plane| plane.dot(p) >= 0.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CullStats {
    pub visible: usize,
    pub hidden: usize,
}

/// Marks each mesh visible when its origin lies inside the camera frustum.
///
/// Point tests against the origin only; a large glyph straddling the edge
/// pops out once its origin leaves.
#[derive(Debug, Default)]
pub struct VisibilityCuller {
    last: CullStats,
}

impl VisibilityCuller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute every mesh's `visible` flag. Nothing else is touched.
    pub fn cull(&mut self, camera: &PerspectiveCamera, scene: &mut SceneGraph) -> CullStats {
        let frustum = Frustum::from_camera(camera);
        let mut stats = CullStats::default();
        for (_, mesh) in scene.meshes_mut() {
            mesh.visible = frustum.contains_point(mesh.transform.position);
            if mesh.visible {
                stats.visible += 1;
            } else {
                stats.hidden += 1;
            }
        }
        self.last = stats;
        stats
    }

    pub fn last(&self) -> CullStats {
        self.last
    }
}
