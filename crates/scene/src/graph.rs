use std::collections::BTreeMap;
use std::sync::Arc;

use glam::Vec3;
use glyphrain_assets::{Resource, Texture};
use glyphrain_common::{Color, MeshId, Transform};
use glyphrain_geometry::{BoxShape, GlyphShape};

/// Which component owns a mesh. Owners only ever touch their own layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Character agents.
    Field,
    /// Avatar and other rig-owned decoration.
    Rig,
}

/// Mesh geometry. Glyph shapes are shared with the geometry cache.
#[derive(Debug, Clone)]
pub enum Geometry {
    Glyph(Arc<GlyphShape>),
    Cuboid(BoxShape),
}

impl Geometry {
    pub fn triangle_count(&self) -> usize {
        match self {
            Self::Glyph(shape) => shape.triangle_count(),
            Self::Cuboid(b) => b.triangle_count(),
        }
    }
}

/// Surface description handed to the renderer.
#[derive(Debug, Clone)]
pub enum Material {
    /// Specular-lit flat color.
    Phong { color: Color },
    /// Physically based, optionally textured. The map is attached while still
    /// loading and shows up once the resource is ready.
    Standard {
        color: Color,
        map: Option<Resource<Texture>>,
        metalness: f32,
        roughness: f32,
    },
}

impl Material {
    pub fn phong(color: Color) -> Self {
        Self::Phong { color }
    }

    /// Texture currently usable for drawing, if any.
    pub fn ready_map(&self) -> Option<Arc<Texture>> {
        match self {
            Self::Standard { map: Some(map), .. } => map.get(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    Point {
        color: Color,
        intensity: f32,
        position: Vec3,
    },
    Ambient {
        color: Color,
        intensity: f32,
    },
}

/// One drawable object.
#[derive(Debug, Clone)]
pub struct MeshNode {
    pub name: String,
    pub layer: Layer,
    pub transform: Transform,
    pub geometry: Geometry,
    /// Ordered materials; glyph meshes use `[front, side]`.
    pub materials: Vec<Material>,
    pub visible: bool,
}

impl MeshNode {
    pub fn new(
        name: impl Into<String>,
        layer: Layer,
        transform: Transform,
        geometry: Geometry,
        materials: Vec<Material>,
    ) -> Self {
        Self {
            name: name.into(),
            layer,
            transform,
            geometry,
            materials,
            visible: true,
        }
    }
}

/// All meshes and lights of the single scene.
///
/// # Invariants
/// - `meshes()` yields meshes in insertion order. Ids are random, so the
///   order never depends on them.
/// - `index` maps every id to its slot in `meshes`.
#[derive(Debug, Default)]
pub struct SceneGraph {
    meshes: Vec<(MeshId, MeshNode)>,
    index: BTreeMap<MeshId, usize>,
    lights: Vec<Light>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a mesh and return its id.
    pub fn add_mesh(&mut self, node: MeshNode) -> MeshId {
        let id = MeshId::new();
        tracing::trace!(id = %id.short(), name = %node.name, layer = ?node.layer, "mesh added");
        self.index.insert(id, self.meshes.len());
        self.meshes.push((id, node));
        id
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn get(&self, id: MeshId) -> Option<&MeshNode> {
        let slot = *self.index.get(&id)?;
        self.meshes.get(slot).map(|(_, node)| node)
    }

    pub fn get_mut(&mut self, id: MeshId) -> Option<&mut MeshNode> {
        let slot = *self.index.get(&id)?;
        self.meshes.get_mut(slot).map(|(_, node)| node)
    }

    /// Replace a mesh's geometry. Returns false if the mesh does not exist.
    pub fn set_geometry(&mut self, id: MeshId, geometry: Geometry) -> bool {
        match self.get_mut(id) {
            Some(node) => {
                node.geometry = geometry;
                true
            }
            None => false,
        }
    }

    pub fn meshes(&self) -> impl Iterator<Item = (MeshId, &MeshNode)> {
        self.meshes.iter().map(|(id, node)| (*id, node))
    }

    pub fn meshes_mut(&mut self) -> impl Iterator<Item = (MeshId, &mut MeshNode)> {
        self.meshes.iter_mut().map(|(id, node)| (*id, node))
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn visible_count(&self) -> usize {
        self.meshes.iter().filter(|(_, m)| m.visible).count()
    }

    pub fn layer_count(&self, layer: Layer) -> usize {
        self.meshes.iter().filter(|(_, m)| m.layer == layer).count()
    }
}
