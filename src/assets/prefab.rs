use glam::Affine3A;

use crate::animation::clip::AnimationClip;
use crate::resources::mesh::Mesh;
use crate::scene::transform::Transform;

/// Prefab node: plain data, children referenced by index.
#[derive(Debug, Clone, Default)]
pub struct PrefabNode {
    pub name: Option<String>,
    pub transform: Transform,
    /// Indices into [`ModelPrefab::nodes`].
    pub children_indices: Vec<usize>,
    pub mesh: Option<Mesh>,
    /// Index into [`ModelPrefab::skeletons`].
    pub skin_index: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct PrefabSkeleton {
    pub name: String,
    /// Joint nodes, as indices into [`ModelPrefab::nodes`].
    pub bone_indices: Vec<usize>,
    pub inverse_bind_matrices: Vec<Affine3A>,
}

/// A decoded model, independent of any scene.
///
/// Holds no handles, so it can be built on any thread and instantiated
/// later with [`Scene::instantiate`].
///
/// [`Scene::instantiate`]: crate::scene::Scene::instantiate
#[derive(Debug, Clone, Default)]
pub struct ModelPrefab {
    pub name: String,
    pub nodes: Vec<PrefabNode>,
    pub root_indices: Vec<usize>,
    pub skeletons: Vec<PrefabSkeleton>,
    pub animations: Vec<AnimationClip>,
}

impl ModelPrefab {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn mesh_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.mesh.is_some()).count()
    }
}
