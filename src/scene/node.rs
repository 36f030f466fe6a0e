use glam::Affine3A;

use crate::scene::skeleton::SkinBinding;
use crate::scene::transform::Transform;
use crate::scene::{CameraKey, MeshKey, NodeHandle};

/// A scene node.
///
/// Nodes form a tree through `parent` / `children`. Components (mesh,
/// camera, skin) are referenced by key into the owning [`Scene`]'s maps.
///
/// A node with `visible == false` hides its whole subtree from rendering;
/// tracking uses this to hide the avatar while the marker is lost.
///
/// [`Scene`]: crate::scene::Scene
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,

    // === Hierarchy ===
    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<NodeHandle>,

    pub transform: Transform,
    pub visible: bool,

    // === Components ===
    pub mesh: Option<MeshKey>,
    pub camera: Option<CameraKey>,
    pub skin: Option<SkinBinding>,
}

impl Node {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            children: Vec::new(),
            transform: Transform::new(),
            visible: true,
            mesh: None,
            camera: None,
            skin: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    /// World matrix as of the last [`Scene::update_matrix_world`].
    ///
    /// [`Scene::update_matrix_world`]: crate::scene::Scene::update_matrix_world
    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.transform.world_matrix
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new("")
    }
}
