use glam::{Affine3A, Mat4};
use slotmap::SlotMap;

use crate::scene::{Node, NodeHandle, SkeletonKey};

/// Skin of a node. Bones follow the skinned node, so the root inverse is
/// the node's current world matrix inverse.
#[derive(Debug, Clone)]
pub struct SkinBinding {
    pub skeleton: SkeletonKey,
}

impl SkinBinding {
    #[must_use]
    pub fn attached(skeleton: SkeletonKey) -> Self {
        Self { skeleton }
    }
}

#[derive(Debug, Clone)]
pub struct Skeleton {
    pub name: String,

    /// Ordered joints; `bones[i]` drives joint index `i` of the vertices.
    pub bones: Vec<NodeHandle>,

    pub(crate) inverse_bind_matrices: Vec<Affine3A>,

    /// Recomputed every frame by [`Scene::update_skeletons`].
    ///
    /// [`Scene::update_skeletons`]: crate::scene::Scene::update_skeletons
    pub(crate) joint_matrices: Vec<Mat4>,
}

impl Skeleton {
    #[must_use]
    pub fn new(name: &str, bones: Vec<NodeHandle>, inverse_bind_matrices: Vec<Affine3A>) -> Self {
        let count = bones.len();
        Self {
            name: name.to_string(),
            bones,
            inverse_bind_matrices,
            joint_matrices: vec![Mat4::IDENTITY; count],
        }
    }

    #[inline]
    #[must_use]
    pub fn joint_matrices(&self) -> &[Mat4] {
        &self.joint_matrices
    }

    /// Computes `root_inv * bone_world * inverse_bind` for every joint.
    ///
    /// Missing inverse bind matrices count as identity.
    pub fn compute_joint_matrices(
        &mut self,
        nodes: &SlotMap<NodeHandle, Node>,
        root_matrix_inv: Affine3A,
    ) {
        for (i, &bone_handle) in self.bones.iter().enumerate() {
            let Some(bone_node) = nodes.get(bone_handle) else {
                continue;
            };
            let ibm = self
                .inverse_bind_matrices
                .get(i)
                .copied()
                .unwrap_or(Affine3A::IDENTITY);

            self.joint_matrices[i] = (root_matrix_inv * bone_node.transform.world_matrix * ibm).into();
        }
    }
}
